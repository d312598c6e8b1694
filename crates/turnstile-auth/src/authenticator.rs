//! Request authenticators
//!
//! An [`Authenticator`] answers two questions for the request gate: does this
//! path need authentication, and who is making the request. Each mode is an
//! independent implementation selected from configuration.

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use turnstile_db::User;

use crate::authority::SessionAuthority;
use crate::credentials::{CredentialSource, Credentials};
use crate::error::AuthError;
use crate::policy::PathPolicy;

/// Authentication mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Authentication disabled
    None,
    /// HTTP Basic credentials on every request
    Basic,
    /// Session cookie issued by the login endpoint
    #[default]
    Session,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Basic => "basic",
            AuthMode::Session => "session",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = String;

    /// Accepts both the short names and the `*_auth` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "auth" => Ok(AuthMode::None),
            "basic" | "basic_auth" => Ok(AuthMode::Basic),
            "session" | "session_auth" => Ok(AuthMode::Session),
            other => Err(format!("Invalid auth mode: {}", other)),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Whether `path` requires authentication
    fn requires_auth(&self, path: &str) -> bool;

    /// Whether the request carries the credential this authenticator reads
    fn has_credentials(&self, headers: &HeaderMap) -> bool;

    /// Resolve the principal making the request
    async fn resolve_from_request(&self, headers: &HeaderMap) -> Result<User, AuthError>;
}

/// Authentication disabled: nothing requires it and nobody is resolved
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    fn requires_auth(&self, _path: &str) -> bool {
        false
    }

    fn has_credentials(&self, _headers: &HeaderMap) -> bool {
        false
    }

    async fn resolve_from_request(&self, _headers: &HeaderMap) -> Result<User, AuthError> {
        Err(AuthError::MissingCredentials)
    }
}

/// Authenticator reading one credential source and resolving it through the
/// session authority
pub struct CredentialAuthenticator {
    policy: PathPolicy,
    authority: Arc<SessionAuthority>,
    source: CredentialSource,
}

impl CredentialAuthenticator {
    /// HTTP Basic authenticator
    pub fn basic(policy: PathPolicy, authority: Arc<SessionAuthority>) -> Self {
        Self {
            policy,
            authority,
            source: CredentialSource::AuthorizationHeader,
        }
    }

    /// Session cookie authenticator
    pub fn session(
        policy: PathPolicy,
        authority: Arc<SessionAuthority>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            policy,
            authority,
            source: CredentialSource::Cookie(cookie_name.into()),
        }
    }
}

#[async_trait]
impl Authenticator for CredentialAuthenticator {
    fn requires_auth(&self, path: &str) -> bool {
        self.policy.requires_auth(Some(path))
    }

    fn has_credentials(&self, headers: &HeaderMap) -> bool {
        match &self.source {
            CredentialSource::AuthorizationHeader => {
                crate::credentials::authorization_header(headers).is_some()
            }
            CredentialSource::Cookie(name) => {
                crate::credentials::session_cookie(headers, name).is_some()
            }
        }
    }

    async fn resolve_from_request(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let credentials =
            Credentials::from_headers(headers, &self.source)?.ok_or(AuthError::MissingCredentials)?;
        self.authority.authenticate(&credentials).await
    }
}

/// Build the authenticator for `mode`
pub fn build_authenticator(
    mode: AuthMode,
    policy: PathPolicy,
    authority: Arc<SessionAuthority>,
    cookie_name: &str,
) -> Arc<dyn Authenticator> {
    match mode {
        AuthMode::None => Arc::new(NoAuth),
        AuthMode::Basic => Arc::new(CredentialAuthenticator::basic(policy, authority)),
        AuthMode::Session => Arc::new(CredentialAuthenticator::session(
            policy,
            authority,
            cookie_name,
        )),
    }
}
