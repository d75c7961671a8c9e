//! Refresh token domain type.
//!
//! A refresh token anchors a chain of access tokens. It is never deleted;
//! revoked records stay in the store because a replayed revoked token is
//! itself an anomaly signal.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{IssuedToken, TokenType};

/// Refresh token stored in the token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// Unique identifier, referenced by the access tokens it spawns.
    pub id: Uuid,

    /// Opaque token string returned to the client.
    pub token: String,

    /// User that owns this token.
    pub user_id: String,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Whether this token has been revoked. Never flips back to `false`.
    pub revoked: bool,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl RefreshToken {
    /// Returns `true` if this token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }

    /// Returns how long the token stays valid after `now`.
    ///
    /// Negative once the token has expired.
    #[must_use]
    pub fn remaining_lifetime(&self, now: OffsetDateTime) -> Duration {
        self.expires_at - now
    }

    /// Returns `true` if the token is neither revoked nor expired at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }
}

impl IssuedToken for RefreshToken {
    const TOKEN_TYPE: TokenType = TokenType::Refresh;

    fn token(&self) -> &str {
        &self.token
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    fn is_revoked(&self) -> bool {
        self.revoked
    }
}

/// Fields needed to persist a new refresh token.
///
/// New tokens always start unrevoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshToken {
    /// Identifier of the new record.
    pub id: Uuid,
    /// Opaque token string.
    pub token: String,
    /// Owner of the token.
    pub user_id: String,
    /// Expiry instant.
    pub expires_at: OffsetDateTime,
    /// Creation instant.
    pub created_at: OffsetDateTime,
}

impl NewRefreshToken {
    /// Builds the stored record from these fields.
    #[must_use]
    pub fn into_token(self) -> RefreshToken {
        RefreshToken {
            id: self.id,
            token: self.token,
            user_id: self.user_id,
            expires_at: self.expires_at,
            revoked: false,
            created_at: self.created_at,
        }
    }
}
