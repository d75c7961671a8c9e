//! Token record types.

pub mod access_token;
pub mod refresh_token;
pub mod token_pair;

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use access_token::{AccessToken, NewAccessToken};
pub use refresh_token::{NewRefreshToken, RefreshToken};
pub use token_pair::TokenPair;

/// The two kinds of token the engine issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer token presented on every request.
    Access,
    /// Longer-lived token used to obtain new access tokens.
    Refresh,
}

impl TokenType {
    /// Returns the lowercase name used in errors and audit events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view over persisted access and refresh tokens.
///
/// The validator runs the same ownership, expiry and revocation checks on
/// both kinds through this trait.
pub trait IssuedToken {
    /// Kind of token this record represents.
    const TOKEN_TYPE: TokenType;

    /// The opaque token string handed to the client.
    fn token(&self) -> &str;

    /// Owner of the token.
    fn user_id(&self) -> &str;

    /// Instant after which the token is expired.
    fn expires_at(&self) -> OffsetDateTime;

    /// Whether the token has been revoked.
    fn is_revoked(&self) -> bool;

    /// Short prefix of the token string, safe to put in logs.
    fn redacted(&self) -> &str {
        redact(self.token())
    }
}

/// Returns at most the first eight characters of a token string.
#[must_use]
pub fn redact(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_display() {
        assert_eq!(TokenType::Access.to_string(), "access");
        assert_eq!(TokenType::Refresh.to_string(), "refresh");
    }

    #[test]
    fn test_token_type_serde() {
        let json = serde_json::to_string(&TokenType::Refresh).unwrap();
        assert_eq!(json, "\"refresh\"");
        let parsed: TokenType = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(parsed, TokenType::Access);
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("0123456789abcdef"), "01234567");
        assert_eq!(redact("abc"), "abc");
        assert_eq!(redact(""), "");
    }
}
