//! Handlers for the Spotify integration: OAuth, playback token, search,
//! audio features and playlist export.

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::Json;
use chrono::{Duration, Utc};
use cycle_core::error::CoreError;
use cycle_core::types::DbId;
use cycle_db::repositories::{LessonPlanRepo, SpotifyConnectionRepo, SpotifyOAuthStateRepo};
use cycle_music::spotify::{generate_state, SpotifyApi, TrackSummary};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::plans::plan_not_found;
use crate::middleware::auth::AuthUser;
use crate::response::MessageResponse;
use crate::spotify_session;
use crate::state::AppState;

/// How long an authorization `state` stays redeemable.
const OAUTH_STATE_TTL_MINS: i64 = 10;

const DEFAULT_SEARCH_LIMIT: u32 = 10;
const MAX_SEARCH_LIMIT: u32 = 50;

const CONNECTED_REDIRECT: &str = "/spotify-connected";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub authorize_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenStatusResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    /// Seconds until the new token expires.
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub tracks: Vec<TrackSummary>,
}

/// Tempo in BPM; the other fields are percentages. Every field is `None`
/// when no source knew the track.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct AudioFeaturesResponse {
    pub tempo: Option<i64>,
    pub energy: Option<i64>,
    pub valence: Option<i64>,
    pub danceability: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub plan_id: DbId,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatePlaylistResponse {
    pub playlist_id: String,
    pub playlist_url: Option<String>,
    pub name: String,
    pub tracks_added: usize,
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

/// GET /api/spotify/login
///
/// Start the authorization-code flow. The returned URL carries a one-time
/// `state` bound to the caller.
pub async fn login(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<AuthorizeResponse>> {
    let spotify = state.spotify()?;

    let cleaned = SpotifyOAuthStateRepo::cleanup_expired(&state.pool).await?;
    if cleaned > 0 {
        tracing::debug!(cleaned, "Removed expired Spotify OAuth states");
    }

    let oauth_state = generate_state();
    let expires_at = Utc::now() + Duration::minutes(OAUTH_STATE_TTL_MINS);
    SpotifyOAuthStateRepo::create(&state.pool, &oauth_state, auth.user_id, expires_at).await?;

    let authorize_url = spotify.authorize_url(&oauth_state)?;
    Ok(Json(AuthorizeResponse { authorize_url }))
}

/// GET /api/spotify/callback
///
/// Public redirect target. The `state` identifies which user authorized.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> AppResult<Redirect> {
    let spotify = state.spotify()?;

    if let Some(error) = params.error.as_deref() {
        tracing::info!(error, "Spotify authorization was not granted");
        return Ok(error_redirect(error));
    }

    let pending = match params.state.as_deref() {
        Some(s) => SpotifyOAuthStateRepo::take(&state.pool, s).await?,
        None => None,
    };
    let Some(pending) = pending else {
        if !state.config.is_development() {
            return Err(AppError::BadRequest("State mismatch".into()));
        }
        tracing::warn!("Spotify callback with unknown state");
        return Ok(error_redirect("state_mismatch"));
    };

    let Some(code) = params.code.as_deref() else {
        return Ok(error_redirect("missing_code"));
    };

    let tokens = match spotify.exchange_code(code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(user_id = pending.user_id, error = %e, "Spotify code exchange failed");
            return Ok(error_redirect("token_exchange_failed"));
        }
    };
    spotify_session::store_tokens(&state, pending.user_id, &tokens).await?;

    match spotify.current_user(&tokens.access_token).await {
        Ok(profile) => tracing::info!(
            user_id = pending.user_id,
            spotify_user = %profile.id,
            "Spotify account connected",
        ),
        Err(e) => tracing::warn!(user_id = pending.user_id, error = %e, "Failed to fetch Spotify profile"),
    }

    Ok(Redirect::to(CONNECTED_REDIRECT))
}

/// GET /api/spotify/token
///
/// Current access token for the Web Playback SDK, refreshed if expired.
pub async fn token(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<TokenStatusResponse>> {
    let access_token = spotify_session::current_access_token(&state, auth.user_id).await?;
    Ok(Json(TokenStatusResponse {
        connected: access_token.is_some(),
        access_token,
    }))
}

/// POST /api/spotify/refresh
pub async fn refresh(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<RefreshResponse>> {
    let connection = spotify_session::force_refresh(&state, auth.user_id).await?;
    Ok(Json(RefreshResponse {
        expires_in: (connection.expires_at - Utc::now()).num_seconds().max(0),
        access_token: connection.access_token,
    }))
}

/// POST /api/spotify/logout
///
/// Forget the caller's Spotify tokens.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    SpotifyConnectionRepo::delete(&state.pool, auth.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Disconnected from Spotify",
    }))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/spotify/search?q=...&limit=...
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let spotify = state.spotify()?;
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Search query must not be empty".into(),
        )));
    }
    let token = spotify_session::require_access_token(&state, auth.user_id).await?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let tracks = spotify
        .search_tracks(&token, query, limit)
        .await?
        .iter()
        .filter_map(TrackSummary::from_track)
        .collect();

    Ok(Json(SearchResponse { tracks }))
}

/// GET /api/spotify/audio-features/{track_id}
///
/// Spotify features when available; otherwise a GetSongBPM tempo lookup by
/// track name and artist.
pub async fn audio_features(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(track_id): Path<String>,
) -> AppResult<Json<AudioFeaturesResponse>> {
    let spotify = state.spotify()?;
    let token = spotify_session::require_access_token(&state, auth.user_id).await?;

    if let Some(features) = spotify.get_audio_features(&token, &track_id).await? {
        return Ok(Json(AudioFeaturesResponse {
            tempo: Some(features.tempo.round() as i64),
            energy: features.energy.map(percent),
            valence: Some(percent(features.valence)),
            danceability: Some(percent(features.danceability)),
        }));
    }

    Ok(Json(AudioFeaturesResponse {
        tempo: fallback_tempo(&state, spotify, &token, &track_id).await?,
        ..AudioFeaturesResponse::default()
    }))
}

/// POST /api/spotify/create-playlist
///
/// Export a saved plan's linked tracks, in segment order, to a new playlist.
pub async fn create_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreatePlaylistRequest>,
) -> AppResult<Json<CreatePlaylistResponse>> {
    let spotify = state.spotify()?;
    let token = spotify_session::require_access_token(&state, auth.user_id).await?;

    let row = LessonPlanRepo::find_for_user(&state.pool, input.plan_id, auth.user_id)
        .await?
        .ok_or_else(|| plan_not_found(input.plan_id))?;
    let plan = row.plan().map_err(|e| {
        AppError::InternalError(format!("Stored plan {} failed to decode: {e}", row.id))
    })?;

    let uris = plan.track_uris();
    if uris.is_empty() {
        return Err(AppError::BadRequest(
            "No Spotify tracks linked to this plan".into(),
        ));
    }

    let playlist = spotify
        .create_playlist(
            &token,
            &format!("Cycle Class: {}", plan.theme),
            &format!(
                "Generated playlist for {} minute cycle class",
                plan.total_duration_minutes()
            ),
            input.public,
        )
        .await?;
    spotify.add_tracks(&token, &playlist.id, &uris).await?;

    tracing::info!(
        user_id = auth.user_id,
        plan_id = row.id,
        playlist_id = %playlist.id,
        tracks = uris.len(),
        "Exported plan to Spotify playlist",
    );
    Ok(Json(CreatePlaylistResponse {
        playlist_url: playlist.web_url().map(str::to_string),
        playlist_id: playlist.id,
        name: playlist.name,
        tracks_added: uris.len(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `0.0..=1.0` to a rounded percentage.
fn percent(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Frontend redirect carrying a machine-readable failure reason.
fn error_redirect(reason: &str) -> Redirect {
    let reason: String = reason
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    Redirect::to(&format!("/?spotify_error={reason}"))
}

async fn fallback_tempo(
    state: &AppState,
    spotify: &SpotifyApi,
    token: &str,
    track_id: &str,
) -> AppResult<Option<i64>> {
    let Some(getsongbpm) = state.getsongbpm.as_deref() else {
        return Ok(None);
    };

    let track = spotify.get_track(token, track_id).await?;
    match getsongbpm
        .search_tempo(&track.name, Some(track.primary_artist()))
        .await
    {
        Ok(tempo) => Ok(tempo.map(i64::from)),
        Err(e) => {
            tracing::warn!(track_id, error = %e, "GetSongBPM tempo lookup failed");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_whole_numbers() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.456), 46);
        assert_eq!(percent(1.0), 100);
    }

    #[test]
    fn error_redirect_strips_unsafe_characters() {
        let redirect = error_redirect("access_denied&next=http://evil");
        let response = axum::response::IntoResponse::into_response(redirect);
        assert_eq!(
            response.headers()["location"],
            "/?spotify_error=access_deniednexthttpevil"
        );
    }
}
