//! Result object returned to the outer request layer.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{AccessToken, RefreshToken};

/// Access/refresh token pair handed back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// The access token string.
    pub access_token: String,

    /// When the access token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub access_token_expires: OffsetDateTime,

    /// The refresh token string.
    pub refresh_token: String,
}

impl TokenPair {
    /// Builds a pair from the stored records.
    #[must_use]
    pub fn new(access_token: &AccessToken, refresh_token: &RefreshToken) -> Self {
        Self {
            access_token: access_token.token.clone(),
            access_token_expires: access_token.expires_at,
            refresh_token: refresh_token.token.clone(),
        }
    }
}
