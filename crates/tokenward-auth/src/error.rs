//! Token engine error types.
//!
//! Anomaly errors (`InvalidToken`, `TokenExpired`) are only returned after the
//! matching revocation has been written to the store, so a caller that sees
//! one of them can assume the cascade already happened.

use std::fmt;

use crate::types::TokenType;

/// Errors that can occur while issuing, validating or rotating tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token is absent, owned by another user, revoked, stale or bound
    /// to a different refresh token.
    #[error("Invalid {token_type} token")]
    InvalidToken {
        /// Which kind of token was rejected.
        token_type: TokenType,
    },

    /// The token is past its expiry.
    #[error("{token_type} token expired")]
    TokenExpired {
        /// Which kind of token expired.
        token_type: TokenType,
    },

    /// The token store failed to read or write.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The engine configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(token_type: TokenType) -> Self {
        Self::InvalidToken { token_type }
    }

    /// Creates a new `TokenExpired` error.
    #[must_use]
    pub fn token_expired(token_type: TokenType) -> Self {
        Self::TokenExpired { token_type }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the token type for token errors.
    #[must_use]
    pub fn token_type(&self) -> Option<TokenType> {
        match self {
            Self::InvalidToken { token_type } | Self::TokenExpired { token_type } => {
                Some(*token_type)
            }
            Self::Storage { .. } | Self::Configuration { .. } => None,
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidToken { .. } | Self::TokenExpired { .. })
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Configuration { .. })
    }

    /// Returns `true` if the caller must send the user back to login.
    ///
    /// Both token errors mean the session cannot be continued; there is no
    /// partial success.
    #[must_use]
    pub fn requires_reauthentication(&self) -> bool {
        self.is_client_error()
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidToken { .. } | Self::TokenExpired { .. } => ErrorCategory::Token,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns a stable machine-readable code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken { .. } => "invalid_token",
            Self::TokenExpired { .. } => "token_expired",
            Self::Storage { .. } => "server_error",
            Self::Configuration { .. } => "server_error",
        }
    }
}

/// Categories of engine errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token-related errors (validation, expiration).
    Token,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}
