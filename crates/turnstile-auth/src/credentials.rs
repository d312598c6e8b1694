//! Credential extraction from request headers

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

use crate::error::AuthError;

/// Credentials presented by a request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Basic base64(email:password)`
    Basic { email: String, password: String },
    /// Opaque session token carried by the session cookie
    Session(String),
}

/// Mask an email address for log output, keeping its first character and domain
///
/// `alice@example.com` becomes `a***@example.com`; anything without an `@`
/// is masked entirely.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{}***@{}", first, domain),
            None => format!("***@{}", domain),
        },
        None => "***".to_string(),
    }
}

// Never print secrets, even at trace level
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", &mask_email(email))
                .field("password", &"***")
                .finish(),
            Credentials::Session(_) => f.debug_tuple("Session").field(&"***").finish(),
        }
    }
}

/// Where an authenticator looks for credentials
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// The `Authorization` header
    AuthorizationHeader,
    /// The named session cookie
    Cookie(String),
}

impl Credentials {
    /// Extract credentials from `headers` according to `source`
    ///
    /// `Ok(None)` means nothing was presented; a header that is present but
    /// unusable is `MalformedCredentials`.
    pub fn from_headers(
        headers: &HeaderMap,
        source: &CredentialSource,
    ) -> Result<Option<Self>, AuthError> {
        match source {
            CredentialSource::AuthorizationHeader => match authorization_header(headers) {
                Some(value) => {
                    let (email, password) = parse_basic_header(value)?;
                    Ok(Some(Credentials::Basic { email, password }))
                }
                None => Ok(None),
            },
            CredentialSource::Cookie(name) => {
                Ok(session_cookie(headers, name).map(Credentials::Session))
            }
        }
    }
}

/// Raw value of the `Authorization` header, if present and ASCII
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

/// Decode a `Basic` authorization header into `(email, password)`
///
/// The decoded text is split on the first `:`, so passwords may contain colons.
pub fn parse_basic_header(header: &str) -> Result<(String, String), AuthError> {
    let encoded = header
        .strip_prefix("Basic ")
        .ok_or(AuthError::MalformedCredentials)?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;

    let (email, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedCredentials)?;

    Ok((email.to_string(), password.to_string()))
}

/// Read the named cookie from the `Cookie` header(s)
pub fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
