//! Session authentication extractors and routes

use axum::{
    Form, Json, Router,
    extract::{FromRequestParts, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
    routing::{delete, post},
};
use serde_json::json;
use tracing::{debug, info};
use turnstile_auth::{AuthError, AuthUser, mask_email, session_cookie};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CredentialsForm, UserResponse};

// ==================== Auth Extractors ====================

/// Extractor for the authenticated user attached by the auth middleware
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed password length (prevent DoS with very large passwords)
pub(crate) const MAX_PASSWORD_LENGTH: usize = 256;

/// Pull a required, non-empty form field
pub(crate) fn required_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} missing", name)))
}

// ==================== Cookies ====================

fn set_session_cookie(name: &str, token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, token))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn clear_session_cookie(name: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{}=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/",
        name
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))
}

// ==================== Session Routes ====================

/// POST /api/v1/auth_session/login
async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let email = required_field(form.email, "email")?;
    let password = required_field(form.password, "password")?;
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    debug!("Login attempt for user: {}", mask_email(&email));

    let (user, token) = match state.authority.login(&email, &password).await {
        Ok(found) => found,
        Err(AuthError::NoSuchUser) if state.reveal_login_failures => {
            return Err(ApiError::NotFound("no user found for this email".to_string()));
        }
        Err(AuthError::BadCredentials) if state.reveal_login_failures => {
            return Err(ApiError::Unauthorized("wrong password".to_string()));
        }
        Err(AuthError::NoSuchUser | AuthError::BadCredentials) => {
            return Err(ApiError::Unauthorized("invalid credentials".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "User logged in");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, set_session_cookie(&state.session_cookie, &token)?);
    Ok((headers, Json(UserResponse::from(user))).into_response())
}

/// DELETE /api/v1/auth_session/logout
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let token = session_cookie(&headers, &state.session_cookie)
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    if !state.authority.destroy_session(&token).await? {
        return Err(ApiError::NotFound("Not found".to_string()));
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, clear_session_cookie(&state.session_cookie)?);
    Ok((StatusCode::OK, response_headers, Json(json!({}))).into_response())
}

/// Create session routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth_session/login", post(login))
        .route("/api/v1/auth_session/logout", delete(logout))
}
