//! User routes

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::{debug, info};
use turnstile_auth::{hash_password, mask_email};
use turnstile_db::{DbError, NewUser};

use crate::error::ApiError;
use crate::state::AppState;

use super::sessions::{CurrentUser, MAX_PASSWORD_LENGTH, required_field};
use super::types::{CredentialsForm, RegisteredResponse, UserResponse};

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate email shape and length
fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::BadRequest("Invalid email address".to_string())),
    }
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== User Routes ====================

/// POST /users
async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let email = required_field(form.email, "email")?;
    let password = required_field(form.password, "password")?;
    validate_email(&email)?;
    validate_password(&password)?;

    debug!("Registering user: {}", mask_email(&email));

    let password_hash = hash_password(&password)?;
    let user = match state.db.insert_user(NewUser { email, password_hash }).await {
        Ok(user) => user,
        Err(DbError::Duplicate(_)) => {
            return Err(ApiError::BadRequest("email already registered".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            id: user.id,
            email: user.email,
            message: "user created".to_string(),
        }),
    ))
}

/// GET /api/v1/users
async fn list_users(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/v1/users/me
async fn get_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;
    Ok(Json(user.into()))
}

/// GET /api/v1/users/{id}
async fn get_user(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/{id}
///
/// Deleting a user also ends all of their sessions.
async fn delete_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.db.delete_user(&id).await?;
    let sessions = state.authority.destroy_user_sessions(&id).await?;

    info!(actor = %actor.id, user_id = %id, sessions, "User deleted");
    Ok(Json(json!({})))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users/me", get(get_me))
        .route("/api/v1/users/{id}", get(get_user).delete(delete_user))
}
