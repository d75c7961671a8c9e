//! Token generation, validation and rotation.
//!
//! - [`generator`] - random token strings and new token records
//! - [`validator`] - anomaly checks and revocation cascades
//! - [`service`] - issuance and refresh orchestration

pub mod generator;
pub mod service;
pub mod validator;

pub use generator::{TOKEN_BYTES, TOKEN_LENGTH, TokenGenerator, generate_token};
pub use service::TokenService;
pub use validator::{ChainPosition, GRACE_WINDOW_DEPTH, TokenValidator, chain_position};
