//! Repository for the `lesson_plans` table.
//!
//! Every query is scoped by `user_id`; a plan owned by someone else behaves
//! exactly like a missing one.

use cycle_core::types::DbId;
use sqlx::PgPool;

use crate::models::lesson_plan::{LessonPlanDocument, LessonPlanRow, LessonPlanSummary};

/// Full row, including the stored plan document.
const COLUMNS: &str = "id, user_id, theme, duration_minutes, plan_json, created_at, updated_at";

/// Listing columns. The document itself is left out.
const SUMMARY_COLUMNS: &str = "id, theme, duration_minutes, created_at, updated_at";

/// Per-user storage of saved lesson plans.
pub struct LessonPlanRepo;

impl LessonPlanRepo {
    /// Save a plan for `user_id`, returning the stored row with its new id.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        doc: &LessonPlanDocument,
    ) -> Result<LessonPlanRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO lesson_plans (user_id, theme, duration_minutes, plan_json)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LessonPlanRow>(&query)
            .bind(user_id)
            .bind(&doc.theme)
            .bind(doc.duration_minutes)
            .bind(&doc.plan_json)
            .fetch_one(pool)
            .await
    }

    /// List the owner's plans, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<LessonPlanSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM lesson_plans
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, LessonPlanSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Fetch one plan with its document, if it exists and belongs to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<LessonPlanRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lesson_plans WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, LessonPlanRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace a plan document. Returns `None` if the plan is missing or not owned.
    pub async fn replace(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        doc: &LessonPlanDocument,
    ) -> Result<Option<LessonPlanRow>, sqlx::Error> {
        let query = format!(
            "UPDATE lesson_plans SET
                theme = $3,
                duration_minutes = $4,
                plan_json = $5
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LessonPlanRow>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&doc.theme)
            .bind(doc.duration_minutes)
            .bind(&doc.plan_json)
            .fetch_optional(pool)
            .await
    }

    /// Delete an owned plan. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lesson_plans WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
