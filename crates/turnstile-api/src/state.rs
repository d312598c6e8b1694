//! Application state

use std::sync::Arc;
use turnstile_auth::{Authenticator, SessionAuthority};
use turnstile_db::Database;

/// Prometheus exporter handle used by the `/metrics` route
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub authority: Arc<SessionAuthority>,
    pub authenticator: Arc<dyn Authenticator>,
    /// Name of the cookie carrying the session token
    pub session_cookie: String,
    /// Report "unknown email" and "wrong password" as distinct login failures
    pub reveal_login_failures: bool,
}

impl AppState {
    pub fn new(
        db: Database,
        authority: Arc<SessionAuthority>,
        authenticator: Arc<dyn Authenticator>,
        session_cookie: String,
        reveal_login_failures: bool,
    ) -> Self {
        Self {
            db,
            authority,
            authenticator,
            session_cookie,
            reveal_login_failures,
        }
    }
}
