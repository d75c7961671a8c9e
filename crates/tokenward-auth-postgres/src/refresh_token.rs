//! Refresh token storage.
//!
//! Rows in `refresh_tokens` are never deleted; revocation flips `revoked`
//! and nothing flips it back.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use tokenward_auth::{NewRefreshToken, RefreshToken};
use uuid::Uuid;

use crate::{PgPool, StorageError, StorageResult, conflict_on_unique, sql_limit};

// =============================================================================
// Types
// =============================================================================

/// Column tuple of a `refresh_tokens` row, in `SELECT` order.
type RefreshTokenTuple = (Uuid, String, String, OffsetDateTime, bool, OffsetDateTime);

const COLUMNS: &str = "id, token, user_id, expires_at, revoked, created_at";

fn from_tuple(row: RefreshTokenTuple) -> RefreshToken {
    RefreshToken {
        id: row.0,
        token: row.1,
        user_id: row.2,
        expires_at: row.3,
        revoked: row.4,
        created_at: row.5,
    }
}

// =============================================================================
// Refresh Token Storage
// =============================================================================

/// Refresh token storage operations.
pub struct RefreshTokenStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> RefreshTokenStorage<'a> {
    /// Create a new refresh token storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a refresh token by its token string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(&self, token: &str) -> StorageResult<Option<RefreshToken>> {
        let row: Option<RefreshTokenTuple> = query_as(&format!(
            "SELECT {COLUMNS} FROM refresh_tokens WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_tuple))
    }

    /// Find a refresh token by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<RefreshToken>> {
        let row: Option<RefreshTokenTuple> = query_as(&format!(
            "SELECT {COLUMNS} FROM refresh_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_tuple))
    }

    /// Create a new refresh token.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the id or token string already exists, or an
    /// error if the insert fails.
    pub async fn create(&self, token: &NewRefreshToken) -> StorageResult<RefreshToken> {
        let row: RefreshTokenTuple = query_as(&format!(
            r#"
            INSERT INTO refresh_tokens (id, token, user_id, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(token.id)
        .bind(&token.token)
        .bind(&token.user_id)
        .bind(token.expires_at)
        .bind(token.created_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Refresh token"))?;

        Ok(from_tuple(row))
    }

    /// Revoke a refresh token by its token string.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the token doesn't exist, or an error if the
    /// database update fails.
    pub async fn revoke(&self, token: &str) -> StorageResult<RefreshToken> {
        let row: Option<RefreshTokenTuple> = query_as(&format!(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE token = $1 RETURNING {COLUMNS}"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::not_found("Refresh token"))
    }

    /// Revoke every refresh token owned by any of `user_ids`.
    ///
    /// Runs as a single statement, so concurrent readers see either none or
    /// all of the revocations.
    ///
    /// # Returns
    ///
    /// Returns the number of tokens that were newly revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all_for_users(&self, user_ids: &[String]) -> StorageResult<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = ANY($1)
              AND revoked = FALSE
            "#,
        )
        .bind(user_ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// List the latest refresh tokens of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<RefreshToken>> {
        let rows: Vec<RefreshTokenTuple> = query_as(&format!(
            r#"
            SELECT {COLUMNS}
            FROM refresh_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(sql_limit(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(from_tuple).collect())
    }
}
