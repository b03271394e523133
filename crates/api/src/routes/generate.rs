//! Route definitions for plan generation, merged at the `/api` root.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generate;
use crate::state::AppState;

/// ```text
/// POST /generate       -> generate (requires auth)
/// GET  /rate-limit     -> rate_limit_status (requires auth)
/// POST /from-playlist  -> from_playlist (requires auth + Spotify)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate::generate))
        .route("/rate-limit", get(generate::rate_limit_status))
        .route("/from-playlist", post(generate::from_playlist))
}
