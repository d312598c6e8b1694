//! Turnstile REST API
//!
//! This crate provides the Axum-based HTTP surface for Turnstile: status,
//! user registration and lookup, and the session login/logout endpoints,
//! all behind the authentication middleware.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
