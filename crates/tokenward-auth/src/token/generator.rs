//! Token generation.
//!
//! Produces opaque random token strings and persists new access and refresh
//! token records with their expiry computed from the engine configuration.

use std::sync::Arc;

use time::Duration;
use uuid::Uuid;

use crate::AuthResult;
use crate::clock::Clock;
use crate::storage::DynTokenStore;
use crate::types::{AccessToken, NewAccessToken, NewRefreshToken, RefreshToken};

/// Number of random bytes in a token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of a generated token string (hex encoded).
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generate a cryptographically secure random token.
///
/// Returns a 256-bit random value encoded as lowercase hex (64 characters).
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    hex::encode(bytes)
}

/// Creates and persists new tokens.
pub struct TokenGenerator {
    store: DynTokenStore,
    clock: Arc<dyn Clock>,
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
}

impl TokenGenerator {
    /// Creates a new generator.
    #[must_use]
    pub fn new(
        store: DynTokenStore,
        clock: Arc<dyn Clock>,
        access_token_lifetime: Duration,
        refresh_token_lifetime: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            access_token_lifetime,
            refresh_token_lifetime,
        }
    }

    /// Creates and stores a new access token bound to `refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the token cannot be persisted.
    pub async fn generate_access_token(
        &self,
        user_id: &str,
        refresh_token: &RefreshToken,
    ) -> AuthResult<AccessToken> {
        debug_assert_eq!(
            user_id, refresh_token.user_id,
            "access token owner must match its refresh token owner"
        );

        let now = self.clock.now();
        let new_token = NewAccessToken {
            token: generate_token(),
            user_id: refresh_token.user_id.clone(),
            expires_at: now + self.access_token_lifetime,
            refresh_token: refresh_token.id,
            created_at: now,
        };

        self.store.create_access_token(&new_token).await
    }

    /// Creates and stores a new refresh token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the token cannot be persisted.
    pub async fn generate_refresh_token(&self, user_id: &str) -> AuthResult<RefreshToken> {
        let now = self.clock.now();
        let new_token = NewRefreshToken {
            id: Uuid::new_v4(),
            token: generate_token(),
            user_id: user_id.to_string(),
            expires_at: now + self.refresh_token_lifetime,
            created_at: now,
        };

        self.store.create_refresh_token(&new_token).await
    }
}
