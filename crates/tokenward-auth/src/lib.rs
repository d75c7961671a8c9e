//! # tokenward-auth
//!
//! Dual-token (access + refresh) issuance, validation and rotation engine.
//!
//! This crate provides:
//! - Opaque random token generation
//! - Validation with theft and replay detection
//! - Revocation cascades on every anomaly
//! - Proactive refresh token rotation
//! - A grace window for concurrent access token refreshes
//! - Audit logging for security events
//!
//! ## Overview
//!
//! A client receives a short-lived access token and a longer-lived refresh
//! token. Every access token is bound to the refresh token that spawned it.
//! Any sign that a token is being replayed (an unknown string, someone
//! else's token, a revoked token, a stale member of a chain) revokes every
//! refresh token of the affected users before the request is rejected.
//!
//! Persistence is abstracted behind [`TokenStore`]; backends live in
//! separate crates.
//!
//! ## Modules
//!
//! - [`config`] - Timing windows of the engine
//! - [`token`] - Token generation, validation and orchestration
//! - [`audit`] - Security event audit logging
//! - [`storage`] - Storage trait for token records
//! - [`clock`] - Injectable time source

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod storage;
pub mod token;
pub mod types;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, TokenEngineConfig};
pub use error::{AuthError, ErrorCategory};
pub use storage::{DynTokenStore, TokenStore};
pub use token::{ChainPosition, TokenGenerator, TokenService, TokenValidator};
pub use types::{
    AccessToken, IssuedToken, NewAccessToken, NewRefreshToken, RefreshToken, TokenPair, TokenType,
};

/// Type alias for token engine results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tokenward_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{ConfigError, TokenEngineConfig};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::storage::{DynTokenStore, TokenStore};
    pub use crate::token::TokenService;
    pub use crate::types::{
        AccessToken, IssuedToken, NewAccessToken, NewRefreshToken, RefreshToken, TokenPair,
        TokenType,
    };
}
