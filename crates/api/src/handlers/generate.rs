//! Handlers that produce new lesson plans (AI generation and playlist import).

use axum::extract::State;
use axum::Json;
use cycle_ai::generate_lesson_plan;
use cycle_core::error::CoreError;
use cycle_core::linker;
use cycle_core::plan::LessonPlan;
use cycle_core::playlist;
use cycle_core::rate_limit::RateLimitStatus;
use cycle_core::types::DbId;
use cycle_db::repositories::LessonPlanRepo;
use cycle_music::catalog::SpotifyCatalog;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::plans::plan_document;
use crate::middleware::auth::AuthUser;
use crate::spotify_session;
use crate::state::AppState;

const DEFAULT_DURATION_MINUTES: u32 = 50;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 500, message = "Theme must be 1-500 characters"))]
    pub theme: String,
    #[serde(default = "default_duration")]
    #[validate(range(min = 15, max = 120, message = "Duration must be between 15 and 120 minutes"))]
    pub duration_minutes: u32,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

#[derive(Debug, Deserialize, Validate)]
pub struct FromPlaylistRequest {
    #[validate(length(min = 1, max = 100))]
    pub playlist_id: String,
    #[validate(length(min = 1, max = 200))]
    pub playlist_name: String,
}

/// A new plan and its saved id. `id` is `None` when the auto-save failed.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub plan: LessonPlan,
    pub id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/generate
///
/// Generate a plan, link its songs when the user has Spotify connected, and
/// save it. Only a successful generation counts against the rate limit.
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    input.validate()?;
    if input.theme.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation("Theme must not be blank".into())));
    }
    let slot = state.rate_limiter.reserve(auth.user_id).await?;

    let plan =
        match generate_lesson_plan(&state.claude, input.theme.trim(), input.duration_minutes).await {
            Ok(plan) => plan,
            Err(e) => {
                state.rate_limiter.release(slot).await;
                return Err(e.into());
            }
        };

    let plan = auto_link(&state, auth.user_id, plan).await;

    let id = match auto_save(&state, auth.user_id, &plan).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(user_id = auth.user_id, error = %e, "Failed to auto-save generated plan");
            None
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        plan_id = ?id,
        segments = plan.segments().len(),
        total_minutes = plan.total_duration_minutes(),
        "Lesson plan generated",
    );
    Ok(Json(GenerateResponse { plan, id }))
}

/// GET /api/rate-limit
pub async fn rate_limit_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<RateLimitStatus> {
    Json(state.rate_limiter.status(auth.user_id).await)
}

/// POST /api/from-playlist
///
/// Build and save a plan with one segment per track of a Spotify playlist.
pub async fn from_playlist(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<FromPlaylistRequest>,
) -> AppResult<Json<GenerateResponse>> {
    input.validate()?;
    let spotify = state.spotify()?;
    let token = spotify_session::require_access_token(&state, auth.user_id).await?;

    let tracks = spotify.playlist_tracks(&token, &input.playlist_id).await?;
    let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
    let features = spotify.audio_features_batch(&token, &ids).await;

    let plan = playlist::convert(&tracks, &features, &input.playlist_name)?;
    let id = auto_save(&state, auth.user_id, &plan).await?;

    tracing::info!(
        user_id = auth.user_id,
        plan_id = id,
        tracks = tracks.len(),
        "Lesson plan created from playlist",
    );
    Ok(Json(GenerateResponse { plan, id: Some(id) }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve segment songs against the user's Spotify catalog, if connected.
async fn auto_link(state: &AppState, user_id: DbId, plan: LessonPlan) -> LessonPlan {
    let Some(spotify) = state.spotify.as_deref() else {
        return plan;
    };

    let token = match spotify_session::current_access_token(state, user_id).await {
        Ok(Some(token)) => token,
        Ok(None) => return plan,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Skipping auto-link, Spotify token lookup failed");
            return plan;
        }
    };

    let catalog = SpotifyCatalog::new(spotify, &token);
    linker::link(plan, Some(&catalog)).await
}

async fn auto_save(state: &AppState, user_id: DbId, plan: &LessonPlan) -> AppResult<DbId> {
    let row = LessonPlanRepo::create(&state.pool, user_id, &plan_document(plan)?).await?;
    Ok(row.id)
}
