//! In-memory token storage backend for tokenward.
//!
//! This crate provides an in-memory implementation of the `TokenStore` trait
//! from `tokenward-auth`. Nothing is persisted; every record is lost when the
//! store is dropped. Intended for tests, development and single-process
//! deployments.
//!
//! # Example
//!
//! ```ignore
//! use tokenward_auth::{TokenEngineConfig, TokenService};
//! use tokenward_db_memory::create_token_store;
//!
//! let service = TokenService::with_system_clock(create_token_store(), TokenEngineConfig::default())?;
//! let pair = service.request_tokens("user-1").await?;
//! ```

pub mod store;

pub use store::InMemoryTokenStore;
pub use tokenward_auth::{DynTokenStore, TokenStore};

/// Creates a new, empty in-memory token store.
#[must_use]
pub fn create_token_store() -> DynTokenStore {
    std::sync::Arc::new(InMemoryTokenStore::new())
}
