//! Token validation and anomaly detection.
//!
//! Checks run in a fixed order and stop at the first failure. Every failure
//! writes its revocation to the store before the error is returned:
//!
//! | Check              | Applies to | Revokes                          | Error          |
//! |--------------------|------------|----------------------------------|----------------|
//! | missing            | both       | all refresh tokens of the caller | `InvalidToken` |
//! | owner mismatch     | both       | all refresh tokens of both users | `InvalidToken` |
//! | expired            | refresh    | that refresh token only          | `TokenExpired` |
//! | already revoked    | both       | all refresh tokens of the caller | `InvalidToken` |
//! | stale (chain)      | access     | all refresh tokens of the caller | `InvalidToken` |
//!
//! Access tokens are not expiry-checked here; an expired access token is
//! the normal input to a refresh.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::audit::{self, LifecycleEvent, TokenAnomaly};
use crate::clock::Clock;
use crate::error::AuthError;
use crate::storage::DynTokenStore;
use crate::types::{AccessToken, IssuedToken, RefreshToken, TokenType};

/// Number of access tokens inspected by the reuse grace window.
pub const GRACE_WINDOW_DEPTH: usize = 2;

/// Where a presented access token sits in its refresh token's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainPosition {
    /// The presented token is the newest of its chain, or there is nothing
    /// to compare it against.
    Current,
    /// The presented token was superseded by `newest` but its expiry is
    /// still inside the grace period.
    WithinGrace {
        /// The access token that superseded the presented one.
        newest: AccessToken,
    },
    /// The presented token is neither the newest nor a tolerated
    /// predecessor.
    Stale,
}

/// Classifies `presented` against the latest tokens of its chain.
///
/// `latest` must be ordered newest first. The second-newest token is
/// tolerated while `expires_at > now - grace`.
#[must_use]
pub fn chain_position(
    presented: &AccessToken,
    latest: &[AccessToken],
    now: OffsetDateTime,
    grace: Duration,
) -> ChainPosition {
    if let [newest, second, ..] = latest
        && second.token == presented.token
        && second.expires_at > now - grace
    {
        return ChainPosition::WithinGrace {
            newest: newest.clone(),
        };
    }

    match latest.first() {
        Some(newest) if newest.token != presented.token => ChainPosition::Stale,
        _ => ChainPosition::Current,
    }
}

/// Validates presented tokens and applies revocation cascades.
pub struct TokenValidator {
    store: DynTokenStore,
    clock: Arc<dyn Clock>,
    grace_period: Duration,
}

impl TokenValidator {
    /// Creates a new validator.
    #[must_use]
    pub fn new(store: DynTokenStore, clock: Arc<dyn Clock>, grace_period: Duration) -> Self {
        Self {
            store,
            clock,
            grace_period,
        }
    }

    /// Runs the generic checks on a looked-up token.
    ///
    /// `token` is `None` when the lookup found nothing. Returns the token
    /// unchanged when it passes.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the token is missing, foreign or revoked
    /// - `TokenExpired` if a refresh token is past its expiry
    /// - `Storage` if a lookup or revocation fails
    pub async fn validate_token<T: IssuedToken>(
        &self,
        user_id: &str,
        token: Option<T>,
    ) -> AuthResult<T> {
        let token_type = T::TOKEN_TYPE;

        // 1. Unknown token string: it was fabricated or guessed.
        let Some(token) = token else {
            return Err(self
                .reject(TokenAnomaly::Fabricated, token_type, user_id, None, &[user_id])
                .await);
        };

        // 2. Someone else's token: both accounts are compromised.
        if token.user_id() != user_id {
            return Err(self
                .reject(
                    TokenAnomaly::CrossUser,
                    token_type,
                    user_id,
                    Some(token.redacted()),
                    &[user_id, token.user_id()],
                )
                .await);
        }

        // 3. Plain expiry is routine and only retires this token.
        if token_type == TokenType::Refresh && token.expires_at() < self.clock.now() {
            let revoked = self.store.revoke_refresh_token(token.token()).await;
            audit::record_anomaly(
                TokenAnomaly::Expired,
                token_type,
                user_id,
                Some(token.redacted()),
                revoked.as_ref().ok().map(|_| 1),
            );
            revoked?;
            return Err(AuthError::token_expired(token_type));
        }

        // 4. A revoked token in circulation means it was stolen.
        if token.is_revoked() {
            return Err(self
                .reject(
                    TokenAnomaly::RevokedReuse,
                    token_type,
                    user_id,
                    Some(token.redacted()),
                    &[user_id],
                )
                .await);
        }

        Ok(token)
    }

    /// Looks up a refresh token and validates it.
    ///
    /// # Errors
    ///
    /// See [`validate_token`](Self::validate_token).
    pub async fn validate_refresh_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> AuthResult<RefreshToken> {
        let found = self.store.find_refresh_token(token).await?;
        self.validate_token(user_id, found).await
    }

    /// Looks up an access token, validates it and applies the reuse grace
    /// window.
    ///
    /// # Errors
    ///
    /// See [`validate_token`](Self::validate_token). Additionally returns
    /// `InvalidToken` after revoking all of the user's refresh tokens when
    /// the token is a stale member of its chain.
    pub async fn validate_access_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> AuthResult<AccessToken> {
        let found = self.store.find_access_token(token).await?;
        let token = self.validate_token(user_id, found).await?;

        match self.chain_position_of(&token).await? {
            ChainPosition::Current => Ok(token),
            ChainPosition::WithinGrace { .. } => {
                audit::record_event(LifecycleEvent::GraceAccepted, user_id, token.redacted());
                Ok(token)
            }
            ChainPosition::Stale => Err(self
                .reject(
                    TokenAnomaly::StaleReuse,
                    TokenType::Access,
                    user_id,
                    Some(token.redacted()),
                    &[user_id],
                )
                .await),
        }
    }

    /// Fetches the latest tokens of `token`'s chain and classifies it.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the lookup fails.
    pub async fn chain_position_of(&self, token: &AccessToken) -> AuthResult<ChainPosition> {
        let latest = self
            .store
            .latest_access_tokens(token.refresh_token, GRACE_WINDOW_DEPTH)
            .await?;
        Ok(chain_position(
            token,
            &latest,
            self.clock.now(),
            self.grace_period,
        ))
    }

    /// Revokes every refresh token of the given users in one store call.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the update fails.
    pub async fn revoke_all_for_users(&self, user_ids: &[&str]) -> AuthResult<u64> {
        let mut ids: Vec<String> = user_ids.iter().map(|id| (*id).to_string()).collect();
        ids.dedup();
        self.store.revoke_refresh_tokens_for_users(&ids).await
    }

    /// Applies the revocation cascade for `anomaly` and records it.
    ///
    /// Returns the error the caller must surface: `InvalidToken` once the
    /// cascade is written, or the `Storage` error when it could not be. The
    /// anomaly is recorded either way.
    pub async fn reject(
        &self,
        anomaly: TokenAnomaly,
        token_type: TokenType,
        user_id: &str,
        token_prefix: Option<&str>,
        revoke_users: &[&str],
    ) -> AuthError {
        let revoked = self.revoke_all_for_users(revoke_users).await;
        audit::record_anomaly(
            anomaly,
            token_type,
            user_id,
            token_prefix,
            revoked.as_ref().ok().copied(),
        );
        match revoked {
            Ok(_) => AuthError::invalid_token(token_type),
            Err(e) => e,
        }
    }
}
