//! Per-user Spotify tokens, refreshed on demand.

use chrono::{Duration, Utc};
use cycle_core::error::CoreError;
use cycle_core::types::DbId;
use cycle_db::models::spotify::{SpotifyConnection, UpsertSpotifyConnection};
use cycle_db::repositories::SpotifyConnectionRepo;
use cycle_music::spotify::TokenResponse;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Persist freshly issued tokens for `user_id`.
pub async fn store_tokens(
    state: &AppState,
    user_id: DbId,
    tokens: &TokenResponse,
) -> AppResult<SpotifyConnection> {
    let input = UpsertSpotifyConnection {
        user_id,
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
    };
    Ok(SpotifyConnectionRepo::upsert(&state.pool, &input).await?)
}

/// A usable access token for `user_id`, or `None` when the user is not
/// connected or the stored token can no longer be refreshed.
pub async fn current_access_token(state: &AppState, user_id: DbId) -> AppResult<Option<String>> {
    let Some(spotify) = state.spotify.as_deref() else {
        return Ok(None);
    };
    let Some(connection) = SpotifyConnectionRepo::find_by_user(&state.pool, user_id).await? else {
        return Ok(None);
    };

    if !connection.is_expired(Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS)) {
        return Ok(Some(connection.access_token));
    }

    let Some(refresh_token) = connection.refresh_token.as_deref() else {
        return Ok(None);
    };

    match spotify.refresh_access_token(refresh_token).await {
        Ok(tokens) => {
            let refreshed = store_tokens(state, user_id, &tokens).await?;
            tracing::debug!(user_id, "Refreshed Spotify access token");
            Ok(Some(refreshed.access_token))
        }
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Failed to refresh Spotify access token");
            Ok(None)
        }
    }
}

/// Like [`current_access_token`], but 401 when there is none.
pub async fn require_access_token(state: &AppState, user_id: DbId) -> AppResult<String> {
    current_access_token(state, user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Not connected to Spotify".into())))
}

/// Exchange the stored refresh token regardless of expiry.
pub async fn force_refresh(state: &AppState, user_id: DbId) -> AppResult<SpotifyConnection> {
    let spotify = state.spotify()?;
    let refresh_token = SpotifyConnectionRepo::find_by_user(&state.pool, user_id)
        .await?
        .and_then(|c| c.refresh_token)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("No refresh token".into())))?;

    let tokens = spotify.refresh_access_token(&refresh_token).await?;
    store_tokens(state, user_id, &tokens).await
}
