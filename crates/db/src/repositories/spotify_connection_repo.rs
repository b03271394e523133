//! Repository for the `spotify_connections` table.

use cycle_core::types::DbId;
use sqlx::PgPool;

use crate::models::spotify::{SpotifyConnection, UpsertSpotifyConnection};

const COLUMNS: &str = "user_id, access_token, refresh_token, expires_at, created_at, updated_at";

pub struct SpotifyConnectionRepo;

impl SpotifyConnectionRepo {
    /// Store tokens for a user, replacing any existing connection.
    ///
    /// A `None` refresh token keeps the stored one (Spotify omits it on
    /// refresh unless it rotates).
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertSpotifyConnection,
    ) -> Result<SpotifyConnection, sqlx::Error> {
        let query = format!(
            "INSERT INTO spotify_connections (user_id, access_token, refresh_token, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, spotify_connections.refresh_token),
                expires_at = EXCLUDED.expires_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SpotifyConnection>(&query)
            .bind(input.user_id)
            .bind(&input.access_token)
            .bind(&input.refresh_token)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<SpotifyConnection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM spotify_connections WHERE user_id = $1");
        sqlx::query_as::<_, SpotifyConnection>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Returns `true` if a connection was removed.
    pub async fn delete(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM spotify_connections WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
