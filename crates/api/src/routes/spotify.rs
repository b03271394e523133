//! Route definitions for the `/spotify` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::spotify;
use crate::state::AppState;

/// Routes mounted at `/spotify`.
///
/// ```text
/// GET  /login                     -> login (requires auth)
/// GET  /callback                  -> callback (public, identified by state)
/// GET  /token                     -> token
/// POST /refresh                   -> refresh
/// POST /logout                    -> logout
/// GET  /search                    -> search
/// GET  /audio-features/{track_id} -> audio_features
/// POST /create-playlist           -> create_playlist
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(spotify::login))
        .route("/callback", get(spotify::callback))
        .route("/token", get(spotify::token))
        .route("/refresh", post(spotify::refresh))
        .route("/logout", post(spotify::logout))
        .route("/search", get(spotify::search))
        .route("/audio-features/{track_id}", get(spotify::audio_features))
        .route("/create-playlist", post(spotify::create_playlist))
}
