//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values, no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use cycle_ai::{ClaudeApiError, GenerateError};
use cycle_api::error::AppError;
use cycle_core::error::CoreError;
use cycle_core::normalize::NormalizeError;
use cycle_core::playlist::ConvertError;
use cycle_music::spotify::SpotifyApiError;
use http_body_util::BodyExt;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Core errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "LessonPlan",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "LessonPlan with id 42 not found");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("duplicate email".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "duplicate email");
}

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Invalid token".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn rate_limited_error_returns_429() {
    let err = AppError::Core(CoreError::RateLimited(
        "Rate limit exceeded. Try again in 3 hours.".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMITED");
    assert_eq!(json["error"], "Rate limit exceeded. Try again in 3 hours.");
}

#[tokio::test]
async fn core_internal_error_is_sanitized() {
    let err = AppError::Core(CoreError::Internal("pool exhausted at 10.0.0.3".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// HTTP-specific errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("State mismatch".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "State mismatch");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn service_unavailable_returns_503() {
    let err = AppError::ServiceUnavailable("Spotify not configured".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(json["error"], "Spotify not configured");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Plan production errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn convert_error_returns_400() {
    let err = AppError::from(ConvertError::InsufficientTracks {
        found: 2,
        required: 3,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("at least 3 tracks"));
}

#[tokio::test]
async fn normalize_error_returns_502_with_reason() {
    let err = AppError::from(GenerateError::Normalize(NormalizeError::TruncatedOutput {
        output_tokens: 4096,
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(
        json["error"],
        "AI response was truncated after 4096 output tokens"
    );
}

#[tokio::test]
async fn claude_error_hides_upstream_body() {
    let err = AppError::from(GenerateError::Api(ClaudeApiError::ApiError {
        status: 401,
        body: "invalid x-api-key".into(),
    }));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert_eq!(json["error"], "AI service request failed");
}

#[tokio::test]
async fn spotify_token_rejection_returns_401() {
    let err = AppError::from(SpotifyApiError::ApiError {
        status: 401,
        body: "The access token expired".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Spotify authorization expired, reconnect Spotify");
}

#[tokio::test]
async fn spotify_error_returns_502() {
    let err = AppError::from(SpotifyApiError::ApiError {
        status: 500,
        body: "oops".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Spotify request failed");
}
