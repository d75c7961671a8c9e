//! Access token domain type.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{IssuedToken, TokenType};

/// Access token stored in the token store.
///
/// Every access token belongs to exactly one refresh token; the chain of
/// access tokens a refresh token spawned is what the reuse grace window is
/// computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Opaque token string returned to the client.
    pub token: String,

    /// User that owns this token. Always equal to the owning refresh
    /// token's user.
    pub user_id: String,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// Whether this token has been revoked.
    pub revoked: bool,

    /// Id of the refresh token that spawned this access token.
    pub refresh_token: Uuid,

    /// When this token was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AccessToken {
    /// Returns `true` if this token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

impl IssuedToken for AccessToken {
    const TOKEN_TYPE: TokenType = TokenType::Access;

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

/// Fields needed to persist a new access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessToken {
    /// Opaque token string.
    pub token: String,
    /// Owner of the token.
    pub user_id: String,
    /// Expiry instant.
    pub expires_at: OffsetDateTime,
    /// Id of the owning refresh token.
    pub refresh_token: Uuid,
    /// Creation instant.
    pub created_at: OffsetDateTime,
}

impl NewAccessToken {
    /// Builds the stored record from these fields.
    #[must_use]
    pub fn into_token(self) -> AccessToken {
        AccessToken {
            token: self.token,
            user_id: self.user_id,
            expires_at: self.expires_at,
            revoked: false,
            refresh_token: self.refresh_token,
            created_at: self.created_at,
        }
    }
}
