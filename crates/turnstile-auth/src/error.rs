//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed credentials")]
    MalformedCredentials,

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("No such user")]
    NoSuchUser,

    #[error("Bad credentials")]
    BadCredentials,

    #[error("No such session")]
    NoSuchSession,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] turnstile_db::DbError),
}

impl AuthError {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedCredentials => "malformed_credentials",
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::NoSuchUser => "no_such_user",
            AuthError::BadCredentials => "bad_credentials",
            AuthError::NoSuchSession => "no_such_session",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::PasswordHash(_) => "password_hash",
            AuthError::Database(_) => "database",
        }
    }

    /// Whether the failure is an ordinary negative authentication outcome
    /// rather than an infrastructure fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AuthError::PasswordHash(_) | AuthError::Database(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // "no such user" and "bad password" must look identical to the client
        let (status, message) = match &self {
            AuthError::MissingCredentials
            | AuthError::MalformedCredentials
            | AuthError::InvalidInput(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::NoSuchUser | AuthError::BadCredentials | AuthError::NoSuchSession => {
                (StatusCode::FORBIDDEN, "Forbidden")
            }
            AuthError::PasswordHash(_) | AuthError::Database(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        };

        error_response(status, message)
    }
}

/// JSON error body shared by every rejection
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = axum::Json(json!({
        "error": message
    }));

    (status, body).into_response()
}
