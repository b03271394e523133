//! Repository for the `user_sessions` table.
//!
//! Each row backs one refresh token. Only the SHA-256 hash of the token is
//! stored, and a token is single-use: [`SessionRepo::consume`] retires it in
//! the same statement that looks it up.

use cycle_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::{CreateSession, UserSession};

/// Column list shared across queries.
const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                       user_agent, created_at, updated_at";

/// Refresh-token session storage.
pub struct SessionRepo;

impl SessionRepo {
    /// Persist the session behind a freshly issued refresh token.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Redeem a refresh token by its hash.
    ///
    /// Marks the matching live session as revoked and returns it. Returns
    /// `None` when the token is unknown, already redeemed, or past
    /// `expires_at`, so two concurrent refreshes with the same token cannot
    /// both succeed.
    pub async fn consume(pool: &PgPool, hash: &str) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET is_revoked = true
             WHERE refresh_token_hash = $1
               AND is_revoked = false
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Sign a user out everywhere. Returns how many live sessions were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Drop a user's dead sessions (revoked, or expired before `cutoff`).
    ///
    /// Called when a new session is issued so rotated tokens do not pile up.
    pub async fn prune_for_user(
        pool: &PgPool,
        user_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions
             WHERE user_id = $1 AND (is_revoked = true OR expires_at < $2)",
        )
        .bind(user_id)
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
