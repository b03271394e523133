pub mod auth;
pub mod generate;
pub mod health;
pub mod plans;
pub mod spotify;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /auth/...            signup, login, refresh, logout, me
/// /generate            AI plan generation
/// /rate-limit          generation quota
/// /from-playlist       plan from a Spotify playlist
/// /plans/...           saved plan CRUD
/// /spotify/...         OAuth, playback token, search, features, export
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(generate::router())
        .nest("/plans", plans::router())
        .nest("/spotify", spotify::router())
}
