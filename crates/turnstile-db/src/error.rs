//! Database error types

use thiserror::Error;

/// Failures surfaced by the persistence layer
#[derive(Error, Debug)]
pub enum DbError {
    /// Driver or connection failure
    #[error("Database error: {0}")]
    Connection(#[from] sqlx::Error),

    /// The addressed row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A unique key (email, session id) is already taken
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}
