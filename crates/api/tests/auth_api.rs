//! HTTP-level integration tests for signup, login, refresh, logout and me.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, get, get_auth, post_auth, post_json, signup, TEST_PASSWORD};
use cycle_db::models::spotify::UpsertSpotifyConnection;
use cycle_db::repositories::{SpotifyConnectionRepo, UserRepo};
use serde_json::json;
use sqlx::PgPool;

async fn login(app: axum::Router, email: &str, password: &str) -> axum::response::Response {
    post_json(
        app,
        "/api/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_returns_tokens_and_user(pool: PgPool) {
    let app = common::build_test_app(pool);
    let json = signup(app, "Rider@Example.com").await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["user"]["email"], "rider@example.com");
    assert!(json["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/auth/signup",
        json!({ "email": "short@example.com", "password": "seven77" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn signup_rejects_invalid_email(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/auth/signup",
        json!({ "email": "not-an-email", "password": TEST_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_signup_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    signup(app.clone(), "twice@example.com").await;

    let response = post_json(
        app,
        "/api/auth/signup",
        json!({ "email": "TWICE@example.com", "password": TEST_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_success(pool: PgPool) {
    let app = common::build_test_app(pool);
    let created = signup(app.clone(), "login@example.com").await;

    let response = login(app, "login@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], created["user"]["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_wrong_password_and_unknown_user_are_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    signup(app.clone(), "wrongpw@example.com").await;

    let wrong = login(app.clone(), "wrongpw@example.com", "incorrect_password").await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ghost = login(app, "ghost@example.com", TEST_PASSWORD).await;
    assert_eq!(ghost.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(ghost).await["error"], "Invalid email or password");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_locks_after_repeated_failures(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    signup(app.clone(), "locked@example.com").await;

    for _ in 0..5 {
        let response = login(app.clone(), "locked@example.com", "bad-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Correct password no longer helps while the lock holds.
    let response = login(app, "locked@example.com", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let user = UserRepo::find_by_email(&pool, "locked@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.locked_until.unwrap() > Utc::now());
}

// ---------------------------------------------------------------------------
// Refresh / logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_tokens(pool: PgPool) {
    let app = common::build_test_app(pool);
    let created = signup(app.clone(), "refresher@example.com").await;
    let refresh_token = created["refresh_token"].as_str().unwrap();

    let response = post_json(
        app.clone(),
        "/api/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"].as_str().unwrap(), refresh_token);

    // The old token was single-use.
    let reused = post_json(
        app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(reused.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_sessions_and_spotify(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let created = signup(app.clone(), "logout@example.com").await;
    let access = created["access_token"].as_str().unwrap();
    let refresh_token = created["refresh_token"].as_str().unwrap();
    let user_id = created["user"]["id"].as_i64().unwrap();

    SpotifyConnectionRepo::upsert(
        &pool,
        &UpsertSpotifyConnection {
            user_id,
            access_token: "spotify-access".to_string(),
            refresh_token: Some("spotify-refresh".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
        },
    )
    .await
    .unwrap();

    let response = post_auth(app.clone(), "/api/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let refreshed = post_json(
        app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(refreshed.status(), StatusCode::UNAUTHORIZED);
    assert!(SpotifyConnectionRepo::find_by_user(&pool, user_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_requires_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/auth/logout", json!({})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Missing Authorization header"
    );
}

// ---------------------------------------------------------------------------
// Me
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_reports_authenticated_user(pool: PgPool) {
    let app = common::build_test_app(pool);
    let created = signup(app.clone(), "me@example.com").await;
    let access = created["access_token"].as_str().unwrap();

    let response = get_auth(app, "/api/auth/me", access).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["email"], "me@example.com");
    assert_eq!(json["user_id"], created["user"]["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_without_or_with_bad_token_is_anonymous(pool: PgPool) {
    let app = common::build_test_app(pool);

    let anonymous = get(app.clone(), "/api/auth/me").await;
    assert_eq!(anonymous.status(), StatusCode::OK);
    assert_eq!(body_json(anonymous).await, json!({ "authenticated": false }));

    let garbage = get_auth(app, "/api/auth/me", "not-a-jwt").await;
    assert_eq!(garbage.status(), StatusCode::OK);
    assert_eq!(body_json(garbage).await["authenticated"], false);
}
