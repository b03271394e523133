#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use cycle_ai::claude::{ClaudeConfig, DEFAULT_MAX_TOKENS};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use cycle_api::auth::jwt::JwtConfig;
use cycle_api::config::{RateLimitConfig, ServerConfig};
use cycle_api::router::build_app_router;
use cycle_api::state::AppState;
use cycle_music::spotify::SpotifyConfig;

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
///
/// Upstream URLs point at a closed local port, so any test that needs an
/// upstream must override them with a stub from [`spawn_stub`].
pub fn test_config() -> ServerConfig {
    ServerConfig {
        app_env: "development".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8000".to_string()],
        request_timeout_secs: 30,
        static_dir: None,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 30,
        },
        claude: ClaudeConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        },
        spotify: None,
        getsongbpm: None,
        rate_limit: RateLimitConfig {
            max_requests: 10,
            window_hours: 24,
        },
    }
}

/// Spotify settings with both endpoints on `base_url`.
pub fn spotify_config(base_url: &str) -> SpotifyConfig {
    SpotifyConfig {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: "http://localhost:8000/api/spotify/callback".to_string(),
        accounts_url: base_url.to_string(),
        api_url: base_url.to_string(),
    }
}

/// Build the full application router with the test config.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Build the full application router, with the same middleware stack as
/// production, from a custom config.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(token)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), Some(token)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, Some(token)).await
}

/// Sign up `email` through the API and return the auth response JSON.
pub async fn signup(app: Router, email: &str) -> Value {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/auth/signup", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}

/// Sign up `email` and return its access token.
pub async fn access_token(app: Router, email: &str) -> String {
    signup(app, email).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
