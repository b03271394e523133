use std::sync::Arc;

use cycle_ai::ClaudeApi;
use cycle_core::rate_limit::RateLimiter;
use cycle_music::getsongbpm::GetSongBpmApi;
use cycle_music::spotify::SpotifyApi;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: cycle_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub claude: Arc<ClaudeApi>,
    /// Present only when Spotify credentials are configured.
    pub spotify: Option<Arc<SpotifyApi>>,
    pub getsongbpm: Option<Arc<GetSongBpmApi>>,
    /// Per-user generation limiter, shared across requests.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build the upstream clients described by `config`.
    pub fn new(pool: cycle_db::DbPool, config: ServerConfig) -> Self {
        let claude = Arc::new(ClaudeApi::new(config.claude.clone()));
        let spotify = config
            .spotify
            .clone()
            .map(|c| Arc::new(SpotifyApi::new(c)));
        let getsongbpm = config
            .getsongbpm
            .as_ref()
            .map(|c| Arc::new(GetSongBpmApi::new(c.api_url.clone(), c.api_key.clone())));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.window_hours,
        ));

        Self {
            pool,
            config: Arc::new(config),
            claude,
            spotify,
            getsongbpm,
            rate_limiter,
        }
    }

    /// The Spotify client, or 503 when the server has no Spotify credentials.
    pub fn spotify(&self) -> AppResult<&SpotifyApi> {
        self.spotify
            .as_deref()
            .ok_or_else(|| AppError::ServiceUnavailable("Spotify not configured".into()))
    }
}
