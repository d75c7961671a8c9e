//! Token service.
//!
//! Orchestrates issuance, refresh and rotation on top of the generator and
//! validator. This is the only entry point the outer layers use.

use std::sync::Arc;

use time::Duration;

use crate::AuthResult;
use crate::audit::{self, LifecycleEvent, TokenAnomaly};
use crate::clock::{Clock, SystemClock};
use crate::config::TokenEngineConfig;
use crate::error::AuthError;
use crate::storage::DynTokenStore;
use crate::token::generator::TokenGenerator;
use crate::token::validator::{ChainPosition, TokenValidator};
use crate::types::{AccessToken, IssuedToken, RefreshToken, TokenPair, TokenType};

/// Dual-token issuance and rotation engine.
///
/// Holds no token state of its own; every call re-reads the store.
pub struct TokenService {
    store: DynTokenStore,
    clock: Arc<dyn Clock>,
    generator: TokenGenerator,
    validator: TokenValidator,
    refresh_threshold: Duration,
}

impl TokenService {
    /// Creates a new token service.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `config` fails validation.
    pub fn new(
        store: DynTokenStore,
        clock: Arc<dyn Clock>,
        config: TokenEngineConfig,
    ) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let generator = TokenGenerator::new(
            store.clone(),
            clock.clone(),
            config.access_token_lifetime(),
            config.refresh_token_lifetime(),
        );
        let validator = TokenValidator::new(store.clone(), clock.clone(), config.grace_period());

        Ok(Self {
            store,
            clock,
            generator,
            validator,
            refresh_threshold: config.refresh_threshold(),
        })
    }

    /// Creates a token service reading the system time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if `config` fails validation.
    pub fn with_system_clock(store: DynTokenStore, config: TokenEngineConfig) -> AuthResult<Self> {
        Self::new(store, Arc::new(SystemClock), config)
    }

    /// Issues a fresh refresh token and an access token bound to it.
    ///
    /// Called after the user has been authenticated by other means.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if persisting either token fails.
    pub async fn request_tokens(&self, user_id: &str) -> AuthResult<TokenPair> {
        let refresh = self.generator.generate_refresh_token(user_id).await?;
        let access = self.generator.generate_access_token(user_id, &refresh).await?;

        audit::record_event(LifecycleEvent::Issued, user_id, refresh.redacted());
        Ok(TokenPair::new(&access, &refresh))
    }

    /// Validates a refresh token and replaces it if it is close to expiry.
    ///
    /// Returns the presented token unchanged while its remaining lifetime is
    /// at least the rotation threshold.
    ///
    /// # Errors
    ///
    /// Propagates validation errors (after their revocation cascade) and
    /// storage errors.
    pub async fn refresh_refresh_token(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> AuthResult<RefreshToken> {
        let refresh = self
            .validator
            .validate_refresh_token(user_id, refresh_token)
            .await?;
        self.rotate_if_due(user_id, refresh).await
    }

    /// Exchanges a (possibly expired) access token and its refresh token for
    /// a current pair.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if either token fails validation or the access token
    ///   was not spawned by the refresh token
    /// - `TokenExpired` if the refresh token has expired
    /// - `Storage` if the store fails
    pub async fn refresh_access_token(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> AuthResult<TokenPair> {
        let access = self
            .validator
            .validate_access_token(user_id, access_token)
            .await?;
        let refresh = self
            .validator
            .validate_refresh_token(user_id, refresh_token)
            .await?;

        if access.refresh_token != refresh.id {
            return Err(self
                .validator
                .reject(
                    TokenAnomaly::BindingMismatch,
                    TokenType::Access,
                    user_id,
                    Some(access.redacted()),
                    &[user_id],
                )
                .await);
        }

        let original_refresh_id = refresh.id;
        let refresh = self.rotate_if_due(user_id, refresh).await?;
        let rotated = refresh.id != original_refresh_id;

        // A concurrent refresh may already have minted a successor.
        let current = match self.validator.chain_position_of(&access).await? {
            ChainPosition::WithinGrace { newest } => newest,
            ChainPosition::Current | ChainPosition::Stale => access,
        };

        let access = if rotated || current.is_expired_at(self.clock.now()) {
            let renewed = self
                .generator
                .generate_access_token(user_id, &refresh)
                .await?;
            audit::record_event(LifecycleEvent::AccessTokenRenewed, user_id, renewed.redacted());
            renewed
        } else {
            current
        };

        Ok(TokenPair::new(&access, &refresh))
    }

    /// Checks an access token presented on a regular request.
    ///
    /// Unlike a refresh, an expired access token is rejected here, as is a
    /// token whose refresh token has been revoked or has expired.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` for every validation anomaly, and for a token whose
    ///   chain has ended
    /// - `TokenExpired` if the access token is past its expiry
    /// - `Storage` if the store fails
    pub async fn authenticate(&self, user_id: &str, access_token: &str) -> AuthResult<AccessToken> {
        let access = self
            .validator
            .validate_access_token(user_id, access_token)
            .await?;

        let now = self.clock.now();
        if access.is_expired_at(now) {
            audit::record_anomaly(
                TokenAnomaly::Expired,
                TokenType::Access,
                user_id,
                Some(access.redacted()),
                Some(0),
            );
            return Err(AuthError::token_expired(TokenType::Access));
        }

        let chain = self
            .store
            .find_refresh_token_by_id(access.refresh_token)
            .await?;
        if !chain.is_some_and(|refresh| refresh.is_active_at(now)) {
            audit::record_anomaly(
                TokenAnomaly::RevokedChain,
                TokenType::Access,
                user_id,
                Some(access.redacted()),
                Some(0),
            );
            return Err(AuthError::invalid_token(TokenType::Access));
        }

        Ok(access)
    }

    /// Ends one session by revoking its refresh token.
    ///
    /// An expired refresh token is already unusable, so it counts as logged
    /// out.
    ///
    /// # Errors
    ///
    /// Propagates validation errors (after their revocation cascade) and
    /// storage errors.
    pub async fn logout(&self, user_id: &str, refresh_token: &str) -> AuthResult<()> {
        let refresh = match self
            .validator
            .validate_refresh_token(user_id, refresh_token)
            .await
        {
            Ok(refresh) => refresh,
            Err(AuthError::TokenExpired { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };

        self.store.revoke_refresh_token(&refresh.token).await?;
        audit::record_event(LifecycleEvent::LoggedOut, user_id, refresh.redacted());
        Ok(())
    }

    /// Ends every session of a user.
    ///
    /// Returns the number of refresh tokens that were revoked.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the update fails.
    pub async fn logout_all(&self, user_id: &str) -> AuthResult<u64> {
        let revoked = self.validator.revoke_all_for_users(&[user_id]).await?;
        audit::record_event(LifecycleEvent::LoggedOut, user_id, "*");
        Ok(revoked)
    }

    /// Lists the user's usable refresh tokens, newest first.
    ///
    /// At most `limit` of the user's latest refresh tokens are inspected.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the lookup fails.
    pub async fn active_sessions(&self, user_id: &str, limit: usize) -> AuthResult<Vec<RefreshToken>> {
        let now = self.clock.now();
        let tokens = self.store.latest_refresh_tokens(user_id, limit).await?;
        Ok(tokens.into_iter().filter(|t| t.is_active_at(now)).collect())
    }

    /// Replaces `refresh` if its remaining lifetime is below the threshold.
    ///
    /// The replacement is persisted before the old token is revoked, so a
    /// failure in between leaves the user with a working token.
    async fn rotate_if_due(&self, user_id: &str, refresh: RefreshToken) -> AuthResult<RefreshToken> {
        if refresh.remaining_lifetime(self.clock.now()) >= self.refresh_threshold {
            return Ok(refresh);
        }

        let replacement = self.generator.generate_refresh_token(user_id).await?;
        self.store.revoke_refresh_token(&refresh.token).await?;

        audit::record_event(
            LifecycleEvent::RefreshTokenRotated,
            user_id,
            replacement.redacted(),
        );
        Ok(replacement)
    }
}
