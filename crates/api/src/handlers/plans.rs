//! Handlers for the owner's saved lesson plans.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cycle_core::error::CoreError;
use cycle_core::plan::LessonPlan;
use cycle_core::types::{DbId, Timestamp};
use cycle_db::models::lesson_plan::{LessonPlanDocument, LessonPlanRow, LessonPlanSummary};
use cycle_db::repositories::LessonPlanRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{MessageResponse, SavedResponse};
use crate::state::AppState;

/// Request body for `POST /plans` and `PUT /plans/{id}`.
///
/// The plan total is recomputed from its segments on deserialization.
#[derive(Debug, Deserialize)]
pub struct SavePlanRequest {
    pub plan: LessonPlan,
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<LessonPlanSummary>,
}

/// A stored plan with its metadata.
#[derive(Debug, Serialize)]
pub struct SavedPlan {
    pub id: DbId,
    pub user_id: DbId,
    pub theme: String,
    pub duration_minutes: i32,
    pub plan: LessonPlan,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SavedPlan {
    pub fn from_row(row: LessonPlanRow) -> AppResult<Self> {
        let plan = row.plan().map_err(|e| {
            AppError::InternalError(format!("Stored plan {} failed to decode: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            theme: row.theme,
            duration_minutes: row.duration_minutes,
            plan,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Storage payload for `plan`.
pub fn plan_document(plan: &LessonPlan) -> AppResult<LessonPlanDocument> {
    LessonPlanDocument::from_plan(plan)
        .map_err(|e| AppError::InternalError(format!("Failed to encode plan: {e}")))
}

pub fn plan_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "LessonPlan",
        id,
    })
}

/// GET /api/plans
pub async fn list_plans(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<PlanListResponse>> {
    let plans = LessonPlanRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(PlanListResponse { plans }))
}

/// POST /api/plans
pub async fn save_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SavePlanRequest>,
) -> AppResult<(StatusCode, Json<SavedResponse>)> {
    let row = LessonPlanRepo::create(&state.pool, auth.user_id, &plan_document(&input.plan)?)
        .await?;
    tracing::info!(user_id = auth.user_id, plan_id = row.id, "Lesson plan saved");

    Ok((
        StatusCode::CREATED,
        Json(SavedResponse {
            id: row.id,
            message: "Plan saved successfully",
        }),
    ))
}

/// GET /api/plans/{id}
pub async fn get_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<SavedPlan>> {
    let row = LessonPlanRepo::find_for_user(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| plan_not_found(id))?;
    Ok(Json(SavedPlan::from_row(row)?))
}

/// PUT /api/plans/{id}
pub async fn update_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<SavePlanRequest>,
) -> AppResult<Json<SavedResponse>> {
    LessonPlanRepo::replace(&state.pool, id, auth.user_id, &plan_document(&input.plan)?)
        .await?
        .ok_or_else(|| plan_not_found(id))?;

    Ok(Json(SavedResponse {
        id,
        message: "Plan updated successfully",
    }))
}

/// DELETE /api/plans/{id}
pub async fn delete_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    if !LessonPlanRepo::delete(&state.pool, id, auth.user_id).await? {
        return Err(plan_not_found(id));
    }
    Ok(Json(MessageResponse {
        message: "Plan deleted successfully",
    }))
}
