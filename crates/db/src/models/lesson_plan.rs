//! Saved lesson plan model and DTOs.

use cycle_core::plan::LessonPlan;
use cycle_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `lesson_plans` table.
///
/// `theme` and `duration_minutes` are denormalized from `plan_json` for
/// listing without decoding every document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LessonPlanRow {
    pub id: DbId,
    pub user_id: DbId,
    pub theme: String,
    pub duration_minutes: i32,
    pub plan_json: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LessonPlanRow {
    /// Decode the stored document. The total is recomputed on the way in.
    pub fn plan(&self) -> Result<LessonPlan, serde_json::Error> {
        serde_json::from_value(self.plan_json.clone())
    }
}

/// Listing entry without the plan body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LessonPlanSummary {
    pub id: DbId,
    pub theme: String,
    pub duration_minutes: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert/replace payload derived from a [`LessonPlan`].
#[derive(Debug, Clone)]
pub struct LessonPlanDocument {
    pub theme: String,
    pub duration_minutes: i32,
    pub plan_json: serde_json::Value,
}

impl LessonPlanDocument {
    pub fn from_plan(plan: &LessonPlan) -> Result<Self, serde_json::Error> {
        Ok(Self {
            theme: plan.theme.clone(),
            duration_minutes: i32::try_from(plan.total_duration_minutes()).unwrap_or(i32::MAX),
            plan_json: serde_json::to_value(plan)?,
        })
    }
}
