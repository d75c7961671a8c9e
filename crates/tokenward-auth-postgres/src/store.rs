//! Owning [`TokenStore`] adapter for the token engine.
//!
//! Wraps a [`PostgresTokenStorage`] (which owns its pool through an `Arc`),
//! so it can be shared as `Arc<dyn TokenStore>`.

use async_trait::async_trait;
use tokenward_auth::{
    AccessToken, AuthError, AuthResult, NewAccessToken, NewRefreshToken, RefreshToken, TokenStore,
};
use uuid::Uuid;

use crate::access_token::AccessTokenStorage;
use crate::refresh_token::RefreshTokenStorage;
use crate::{PostgresTokenStorage, StorageError};

fn to_auth_error(e: StorageError) -> AuthError {
    AuthError::storage(e.to_string())
}

/// PostgreSQL-backed token store.
#[derive(Clone)]
pub struct PgTokenStore {
    storage: PostgresTokenStorage,
}

impl PgTokenStore {
    /// Create a new token store over `storage`.
    #[must_use]
    pub fn new(storage: PostgresTokenStorage) -> Self {
        Self { storage }
    }

    fn access(&self) -> AccessTokenStorage<'_> {
        self.storage.access_tokens()
    }

    fn refresh(&self) -> RefreshTokenStorage<'_> {
        self.storage.refresh_tokens()
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn find_access_token(&self, token: &str) -> AuthResult<Option<AccessToken>> {
        self.access()
            .find_by_token(token)
            .await
            .map_err(to_auth_error)
    }

    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        self.refresh()
            .find_by_token(token)
            .await
            .map_err(to_auth_error)
    }

    async fn find_refresh_token_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshToken>> {
        self.refresh().find_by_id(id).await.map_err(to_auth_error)
    }

    async fn create_access_token(&self, token: &NewAccessToken) -> AuthResult<AccessToken> {
        self.access().create(token).await.map_err(to_auth_error)
    }

    async fn create_refresh_token(&self, token: &NewRefreshToken) -> AuthResult<RefreshToken> {
        self.refresh().create(token).await.map_err(to_auth_error)
    }

    async fn revoke_refresh_token(&self, token: &str) -> AuthResult<RefreshToken> {
        self.refresh().revoke(token).await.map_err(to_auth_error)
    }

    async fn revoke_refresh_tokens_for_users(&self, user_ids: &[String]) -> AuthResult<u64> {
        self.refresh()
            .revoke_all_for_users(user_ids)
            .await
            .map_err(to_auth_error)
    }

    async fn latest_access_tokens(
        &self,
        refresh_token_id: Uuid,
        limit: usize,
    ) -> AuthResult<Vec<AccessToken>> {
        self.access()
            .latest_for_refresh_token(refresh_token_id, limit)
            .await
            .map_err(to_auth_error)
    }

    async fn latest_refresh_tokens(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AuthResult<Vec<RefreshToken>> {
        self.refresh()
            .latest_for_user(user_id, limit)
            .await
            .map_err(to_auth_error)
    }
}
