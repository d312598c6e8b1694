//! Turnstile Database Layer
//!
//! This crate provides the persistence collaborator for Turnstile:
//! user records and the durable session table, stored in SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
