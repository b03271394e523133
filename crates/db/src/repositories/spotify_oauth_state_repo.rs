//! Repository for the `spotify_oauth_states` table.

use cycle_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::spotify::SpotifyOAuthState;

const COLUMNS: &str = "state, user_id, expires_at, created_at";

pub struct SpotifyOAuthStateRepo;

impl SpotifyOAuthStateRepo {
    pub async fn create(
        pool: &PgPool,
        state: &str,
        user_id: DbId,
        expires_at: Timestamp,
    ) -> Result<SpotifyOAuthState, sqlx::Error> {
        let query = format!(
            "INSERT INTO spotify_oauth_states (state, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SpotifyOAuthState>(&query)
            .bind(state)
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Consume a pending state. Each state can be taken at most once, and
    /// expired states are never returned.
    pub async fn take(pool: &PgPool, state: &str) -> Result<Option<SpotifyOAuthState>, sqlx::Error> {
        let query = format!(
            "DELETE FROM spotify_oauth_states
             WHERE state = $1 AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SpotifyOAuthState>(&query)
            .bind(state)
            .fetch_optional(pool)
            .await
    }

    /// Delete expired states. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM spotify_oauth_states WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
