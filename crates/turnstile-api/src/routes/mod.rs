//! API routes

mod sessions;
mod status;
pub mod types;
mod users;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use turnstile_auth::auth_middleware;

pub use sessions::CurrentUser;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

/// Fallback for unknown routes
async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Create the main router
///
/// Every route sits behind the authentication middleware; which paths are
/// actually exempt is decided by the configured authenticator.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let authenticator = state.authenticator.clone();

    let mut router = Router::new()
        .merge(status::routes())
        .merge(users::routes())
        .merge(sessions::routes())
        .layer(middleware::from_fn_with_state(authenticator, auth_middleware))
        .with_state(state)
        .fallback(not_found);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{Request, Response, StatusCode};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::Value;
    use tower::ServiceExt;
    use turnstile_auth::{AuthMode, MemorySessionStore, PathPolicy, SessionAuthority, build_authenticator};
    use turnstile_db::Database;

    const COOKIE_NAME: &str = "_my_session_id";
    const EXCLUDED: &[&str] = &[
        "/api/v1/status/",
        "/api/v1/unauthorized/",
        "/api/v1/forbidden/",
        "/api/v1/auth_session/login/",
        "/api/v1/auth_session/logout/",
        "/users/",
    ];

    async fn test_app(mode: AuthMode, reveal_login_failures: bool) -> Router {
        let db = Database::in_memory().await.unwrap();
        let authority = Arc::new(SessionAuthority::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(db.clone()),
        ));
        let authenticator =
            build_authenticator(mode, PathPolicy::new(EXCLUDED), authority.clone(), COOKIE_NAME);
        let state = AppState::new(
            db,
            authority,
            authenticator,
            COOKIE_NAME.to_string(),
            reveal_login_failures,
        );
        create_router(state, None)
    }

    fn form(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with(uri: &str, header: Option<(axum::http::HeaderName, String)>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Extract the session token from a login response
    fn session_token(response: &Response<Body>) -> String {
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let pair = cookie.split(';').next().unwrap();
        let (name, value) = pair.split_once('=').unwrap();
        assert_eq!(name, COOKIE_NAME);
        value.to_string()
    }

    async fn register(app: &Router, email: &str, password: &str) -> StatusCode {
        let body = format!("email={}&password={}", email, password);
        app.clone()
            .oneshot(form("POST", "/users", &body))
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_status_is_public() {
        let app = test_app(AuthMode::Session, false).await;

        let response = app.clone().oneshot(get_with("/api/v1/status", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "OK");

        let response = app.oneshot(get_with("/api/v1/stats", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_boundary_error_pages() {
        let app = test_app(AuthMode::Session, false).await;

        let response = app.clone().oneshot(get_with("/api/v1/unauthorized", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");

        let response = app.clone().oneshot(get_with("/api/v1/forbidden", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "Forbidden");

        let response = app.oneshot(get_with("/nowhere", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Not found");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_app(AuthMode::Session, false).await;

        assert_eq!(register(&app, "a@b.com", "password1").await, StatusCode::CREATED);
        assert_eq!(register(&app, "a@b.com", "password1").await, StatusCode::BAD_REQUEST);
        assert_eq!(register(&app, "", "password1").await, StatusCode::BAD_REQUEST);
        assert_eq!(register(&app, "c@d.com", "").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_login_flow() {
        let app = test_app(AuthMode::Session, false).await;
        register(&app, "a@b.com", "password1").await;

        let response = app
            .clone()
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=a@b.com&password=password1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = session_token(&response);
        let user = json_body(response).await;
        assert_eq!(user["email"], "a@b.com");
        assert!(user.get("password_hash").is_none());

        let cookie = Some((COOKIE, format!("{}={}", COOKIE_NAME, token)));
        let response = app
            .clone()
            .oneshot(get_with("/api/v1/users/me", cookie.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "a@b.com");

        let response = app
            .clone()
            .oneshot(get_with("/api/v1/stats", cookie.clone()))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["users"], 1);

        // Logout ends the session
        let mut logout = form("DELETE", "/api/v1/auth_session/logout", "");
        logout
            .headers_mut()
            .insert(COOKIE, format!("{}={}", COOKIE_NAME, token).parse().unwrap());
        let response = app.clone().oneshot(logout).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get_with("/api/v1/users/me", cookie.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // A second logout finds nothing to destroy
        let mut logout = form("DELETE", "/api/v1/auth_session/logout", "");
        logout
            .headers_mut()
            .insert(COOKIE, format!("{}={}", COOKIE_NAME, token).parse().unwrap());
        let response = app.oneshot(logout).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let app = test_app(AuthMode::Session, false).await;

        let response = app
            .clone()
            .oneshot(form("POST", "/api/v1/auth_session/login", "password=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "email missing");

        let response = app
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=a@b.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "password missing");
    }

    #[tokio::test]
    async fn test_login_failures_are_collapsed_by_default() {
        let app = test_app(AuthMode::Session, false).await;
        register(&app, "a@b.com", "password1").await;

        let unknown = app
            .clone()
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=x@b.com&password=password1"))
            .await
            .unwrap();
        let wrong = app
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=a@b.com&password=nope"))
            .await
            .unwrap();

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(unknown).await, json_body(wrong).await);
    }

    #[tokio::test]
    async fn test_login_failures_revealed_when_configured() {
        let app = test_app(AuthMode::Session, true).await;
        register(&app, "a@b.com", "password1").await;

        let unknown = app
            .clone()
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=x@b.com&password=password1"))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(unknown).await["error"], "no user found for this email");

        let wrong = app
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=a@b.com&password=nope"))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(wrong).await["error"], "wrong password");
    }

    #[tokio::test]
    async fn test_basic_auth_mode() {
        let app = test_app(AuthMode::Basic, false).await;
        register(&app, "a@b.com", "password1").await;

        let good = Some((AUTHORIZATION, format!("Basic {}", STANDARD.encode("a@b.com:password1"))));
        let response = app.clone().oneshot(get_with("/api/v1/users", good)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

        let bad = Some((AUTHORIZATION, format!("Basic {}", STANDARD.encode("a@b.com:nope"))));
        let response = app.clone().oneshot(get_with("/api/v1/users", bad)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let garbage = Some((AUTHORIZATION, "Basic ???".to_string()));
        let response = app.clone().oneshot(get_with("/api/v1/users", garbage)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app.oneshot(get_with("/api/v1/users", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_delete_user_ends_sessions() {
        let app = test_app(AuthMode::Session, false).await;
        register(&app, "a@b.com", "password1").await;

        let response = app
            .clone()
            .oneshot(form("POST", "/api/v1/auth_session/login", "email=a@b.com&password=password1"))
            .await
            .unwrap();
        let token = session_token(&response);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();
        let cookie = format!("{}={}", COOKIE_NAME, token);

        let mut request = get_with("/api/v1/users/no-such-id", Some((COOKIE, cookie.clone())));
        *request.method_mut() = axum::http::Method::DELETE;
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "User no-such-id not found");

        let mut request = get_with(&format!("/api/v1/users/{}", id), Some((COOKIE, cookie.clone())));
        *request.method_mut() = axum::http::Method::DELETE;
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get_with("/api/v1/users/me", Some((COOKIE, cookie))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_auth_disabled() {
        let app = test_app(AuthMode::None, false).await;

        let response = app.clone().oneshot(get_with("/api/v1/stats", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // No principal is ever attached when authentication is off
        let response = app.oneshot(get_with("/api/v1/users/me", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
