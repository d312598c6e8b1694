//! Turnstile Authentication
//!
//! This crate provides the session-authentication core: the excluded-path
//! policy, the session authority that mints and revokes opaque session
//! tokens, the per-mode request authenticators and the Axum middleware that
//! ties them together.

pub mod authenticator;
pub mod authority;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod store;

pub use authenticator::{AuthMode, Authenticator, CredentialAuthenticator, NoAuth, build_authenticator};
pub use authority::SessionAuthority;
pub use credentials::{
    CredentialSource, Credentials, mask_email, parse_basic_header, session_cookie,
};
pub use directory::UserDirectory;
pub use error::AuthError;
pub use middleware::{AuthUser, auth_middleware};
pub use password::{hash_password, verify_password};
pub use policy::{PathPolicy, requires_auth};
pub use store::{MemorySessionStore, SessionStore};
