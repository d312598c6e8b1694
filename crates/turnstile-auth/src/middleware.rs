//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use turnstile_db::User;

use crate::authenticator::Authenticator;
use crate::error::error_response;

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}

/// Authentication middleware
///
/// Paths the authenticator exempts pass straight through. Otherwise a request
/// without credentials is rejected with 401, and one whose credentials do not
/// resolve to a user with 403. On success the [`AuthUser`] is added to the
/// request extensions.
pub async fn auth_middleware(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !authenticator.requires_auth(request.uri().path()) {
        return next.run(request).await;
    }

    if !authenticator.has_credentials(request.headers()) {
        metrics::counter!("turnstile_auth_failures_total", "kind" => "missing_credentials")
            .increment(1);
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let resolved = authenticator.resolve_from_request(request.headers()).await;
    match resolved {
        Ok(user) => {
            let user = AuthUser::from(&user);
            debug!(user_id = %user.id, "Authenticated user");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) if e.is_rejection() => {
            debug!(kind = e.kind(), path = %request.uri().path(), "Authentication rejected");
            metrics::counter!("turnstile_auth_failures_total", "kind" => e.kind()).increment(1);
            error_response(StatusCode::FORBIDDEN, "Forbidden")
        }
        Err(e) => {
            warn!("Authentication backend failure: {}", e);
            e.into_response()
        }
    }
}
