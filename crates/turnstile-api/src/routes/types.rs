//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use turnstile_db::User;

// ==================== Auth Types ====================

/// Form-encoded `email` / `password` pair used by login and registration
///
/// Fields are optional so a missing field can be reported by name.
#[derive(Deserialize, Default)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ==================== User Types ====================

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Registration response
#[derive(Serialize)]
pub struct RegisteredResponse {
    pub id: String,
    pub email: String,
    pub message: String,
}

// ==================== Status Types ====================

/// Status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
}

/// Object counts
#[derive(Serialize)]
pub struct StatsResponse {
    pub users: i64,
}
