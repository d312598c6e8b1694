//! Session authority
//!
//! Mints, resolves and revokes opaque session tokens, and turns presented
//! credentials into an authenticated [`User`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use turnstile_db::User;

use crate::credentials::Credentials;
use crate::directory::UserDirectory;
use crate::error::AuthError;
use crate::password::verify_password;
use crate::store::SessionStore;

/// Random bytes per session token (256 bits)
const TOKEN_BYTES: usize = 32;

/// Verified when the email is unknown so both failure paths do the same work.
/// This is a valid Argon2 hash that never matches.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Generate an unguessable, URL-safe session token
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Owner of the session store
pub struct SessionAuthority {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    session_ttl: Option<Duration>,
}

impl SessionAuthority {
    /// Create an authority whose sessions never expire
    pub fn new(store: Arc<dyn SessionStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            store,
            users,
            session_ttl: None,
        }
    }

    /// Expire sessions older than `ttl` on their next lookup
    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl.filter(|ttl| *ttl > Duration::zero());
        self
    }

    /// Create a session for `user_id` and return its token
    pub async fn create_session(&self, user_id: &str) -> Result<String, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidInput("user id is empty".to_string()));
        }

        let token = generate_token();
        self.store.insert(&token, user_id).await?;

        metrics::counter!("turnstile_sessions_created_total").increment(1);
        debug!(user_id, "Session created");
        Ok(token)
    }

    /// Resolve the user bound to `session_id`
    ///
    /// Unknown, empty and expired tokens all resolve to `None`.
    pub async fn resolve_user(&self, session_id: &str) -> Result<Option<String>, AuthError> {
        if session_id.is_empty() {
            return Ok(None);
        }

        let Some(record) = self.store.get(session_id).await? else {
            return Ok(None);
        };

        // An expiry past the end of representable time never arrives
        if let Some(expires_at) = self
            .session_ttl
            .and_then(|ttl| record.created_at.checked_add_signed(ttl))
            && expires_at <= Utc::now()
        {
            debug!(user_id = %record.user_id, "Session expired");
            self.store.remove(session_id).await?;
            return Ok(None);
        }

        Ok(Some(record.user_id))
    }

    /// Destroy a session, returning whether it existed
    pub async fn destroy_session(&self, session_id: &str) -> Result<bool, AuthError> {
        if session_id.is_empty() {
            return Ok(false);
        }

        let removed = self.store.remove(session_id).await?;
        if removed {
            metrics::counter!("turnstile_sessions_destroyed_total").increment(1);
        }
        Ok(removed)
    }

    /// Destroy every session owned by `user_id`
    pub async fn destroy_user_sessions(&self, user_id: &str) -> Result<usize, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidInput("user id is empty".to_string()));
        }

        let removed = self.store.remove_for_user(user_id).await?;
        metrics::counter!("turnstile_sessions_destroyed_total").increment(removed as u64);
        debug!(user_id, removed, "User sessions destroyed");
        Ok(removed)
    }

    /// Authenticate presented credentials
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthError> {
        match credentials {
            Credentials::Basic { email, password } => self.verify_credentials(email, password).await,
            Credentials::Session(token) => {
                let user_id = self
                    .resolve_user(token)
                    .await?
                    .ok_or(AuthError::NoSuchSession)?;
                self.users
                    .find_by_id(&user_id)
                    .await?
                    .ok_or(AuthError::NoSuchUser)
            }
        }
    }

    /// Verify an email/password pair and open a session for the user
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let user = self.verify_credentials(email, password).await?;
        let token = self.create_session(&user.id).await?;
        Ok((user, token))
    }

    /// Check an email/password pair against the directory
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MalformedCredentials);
        }

        match self.users.find_by_email(email).await? {
            Some(user) => {
                if verify_password(password, &user.password_hash)? {
                    Ok(user)
                } else {
                    Err(AuthError::BadCredentials)
                }
            }
            None => {
                let _ = verify_password(password, DUMMY_HASH);
                Err(AuthError::NoSuchUser)
            }
        }
    }
}
