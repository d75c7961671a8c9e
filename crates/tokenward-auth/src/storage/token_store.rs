//! Token store trait.
//!
//! This module defines the persistence interface the engine depends on.
//!
//! # Consistency Requirements
//!
//! - Token strings must be unique; `create_*` fails on a duplicate
//! - `revoke_refresh_tokens_for_users` must be a single atomic update, never
//!   a per-token loop, so a cascade cannot be half-applied by a race
//! - No operation may set `revoked` back to `false`
//! - Records are never deleted

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::{AccessToken, NewAccessToken, NewRefreshToken, RefreshToken};

/// Storage trait for access and refresh tokens.
///
/// Every method is a suspension point of the engine: other in-flight
/// operations on the same user's tokens may interleave between two calls.
///
/// # Implementations
///
/// Implementations are provided in separate crates:
/// - `tokenward-auth-postgres` - PostgreSQL storage backend
/// - `tokenward-db-memory` - in-process storage for tests and development
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Finds an access token by its token string.
    ///
    /// Returns tokens regardless of expiry or revocation status.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_access_token(&self, token: &str) -> AuthResult<Option<AccessToken>>;

    /// Finds a refresh token by its token string.
    ///
    /// Returns tokens regardless of expiry or revocation status.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Finds a refresh token by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_refresh_token_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshToken>>;

    /// Stores a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token string already exists or the storage
    /// operation fails.
    async fn create_access_token(&self, token: &NewAccessToken) -> AuthResult<AccessToken>;

    /// Stores a new refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token string or id already exists or the
    /// storage operation fails.
    async fn create_refresh_token(&self, token: &NewRefreshToken) -> AuthResult<RefreshToken>;

    /// Marks one refresh token as revoked and returns the updated record.
    ///
    /// Revoking an already revoked token is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not found or the operation fails.
    async fn revoke_refresh_token(&self, token: &str) -> AuthResult<RefreshToken>;

    /// Revokes every refresh token owned by any of `user_ids` in one
    /// atomic update.
    ///
    /// # Returns
    ///
    /// Returns the number of tokens that changed from unrevoked to revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn revoke_refresh_tokens_for_users(&self, user_ids: &[String]) -> AuthResult<u64>;

    /// Returns up to `limit` access tokens spawned by a refresh token,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn latest_access_tokens(
        &self,
        refresh_token_id: Uuid,
        limit: usize,
    ) -> AuthResult<Vec<AccessToken>>;

    /// Returns up to `limit` refresh tokens owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn latest_refresh_tokens(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AuthResult<Vec<RefreshToken>>;
}
