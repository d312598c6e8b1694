//! User directory
//!
//! Read-only view of the principals the authority authenticates against.

use async_trait::async_trait;
use turnstile_db::{Database, User};

use crate::error::AuthError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;
}

#[async_trait]
impl UserDirectory for Database {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.get_user_by_email(email).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        Ok(self.get_user_by_id(id).await?)
    }
}
