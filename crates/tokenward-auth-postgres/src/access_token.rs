//! Access token storage.

use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use tokenward_auth::{AccessToken, NewAccessToken};
use uuid::Uuid;

use crate::{PgPool, StorageResult, conflict_on_unique, sql_limit};

/// Column tuple of an `access_tokens` row, in `SELECT` order.
type AccessTokenTuple = (String, String, Uuid, OffsetDateTime, bool, OffsetDateTime);

const COLUMNS: &str = "token, user_id, refresh_token_id, expires_at, revoked, created_at";

fn from_tuple(row: AccessTokenTuple) -> AccessToken {
    AccessToken {
        token: row.0,
        user_id: row.1,
        refresh_token: row.2,
        expires_at: row.3,
        revoked: row.4,
        created_at: row.5,
    }
}

/// Access token storage operations.
pub struct AccessTokenStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> AccessTokenStorage<'a> {
    /// Create a new access token storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find an access token by its token string.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(&self, token: &str) -> StorageResult<Option<AccessToken>> {
        let row: Option<AccessTokenTuple> = query_as(&format!(
            "SELECT {COLUMNS} FROM access_tokens WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_tuple))
    }

    /// Create a new access token.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the token string already exists, or an error if
    /// the insert fails (including an unknown refresh token id).
    pub async fn create(&self, token: &NewAccessToken) -> StorageResult<AccessToken> {
        let row: AccessTokenTuple = query_as(&format!(
            r#"
            INSERT INTO access_tokens (token, user_id, refresh_token_id, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&token.token)
        .bind(&token.user_id)
        .bind(token.refresh_token)
        .bind(token.expires_at)
        .bind(token.created_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Access token"))?;

        Ok(from_tuple(row))
    }

    /// List the latest access tokens spawned by a refresh token, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn latest_for_refresh_token(
        &self,
        refresh_token_id: Uuid,
        limit: usize,
    ) -> StorageResult<Vec<AccessToken>> {
        let rows: Vec<AccessTokenTuple> = query_as(&format!(
            r#"
            SELECT {COLUMNS}
            FROM access_tokens
            WHERE refresh_token_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2
            "#
        ))
        .bind(refresh_token_id)
        .bind(sql_limit(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(from_tuple).collect())
    }
}
