//! Storage traits for token records.
//!
//! The engine never talks to a database directly; it goes through
//! [`TokenStore`].
//!
//! # Implementations
//!
//! - `tokenward-auth-postgres` - PostgreSQL storage backend
//! - `tokenward-db-memory` - in-memory storage backend

pub mod token_store;

pub use token_store::TokenStore;

/// Type alias for a shareable token store.
pub type DynTokenStore = std::sync::Arc<dyn TokenStore>;
