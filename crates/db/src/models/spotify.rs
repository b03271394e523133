//! Spotify authorization models.

use cycle_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A user's Spotify tokens from the `spotify_connections` table.
#[derive(Debug, Clone, FromRow)]
pub struct SpotifyConnection {
    pub user_id: DbId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SpotifyConnection {
    /// Whether the access token has expired as of `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// DTO for storing freshly issued tokens.
#[derive(Debug, Clone)]
pub struct UpsertSpotifyConnection {
    pub user_id: DbId,
    pub access_token: String,
    /// `None` keeps the previously stored refresh token.
    pub refresh_token: Option<String>,
    pub expires_at: Timestamp,
}

/// A pending OAuth authorization from `spotify_oauth_states`.
#[derive(Debug, Clone, FromRow)]
pub struct SpotifyOAuthState {
    pub state: String,
    pub user_id: DbId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}
