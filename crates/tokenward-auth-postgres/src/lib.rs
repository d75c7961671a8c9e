//! PostgreSQL storage backend for tokenward-auth
//!
//! Provides persistent storage for:
//!
//! - Refresh tokens (`refresh_tokens` table)
//! - Access tokens (`access_tokens` table, bound to a refresh token)
//!
//! The schema is created by embedded migrations, see [`migrations`].
//!
//! # Example
//!
//! ```ignore
//! use tokenward_auth_postgres::{PostgresConfig, PostgresTokenStorage};
//!
//! let storage = PostgresTokenStorage::from_config(&PostgresConfig::new(url)).await?;
//! let service = TokenService::with_system_clock(storage.token_store(), engine_config)?;
//! ```

pub mod access_token;
pub mod config;
pub mod migrations;
pub mod refresh_token;
pub mod store;

use std::sync::Arc;

use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_postgres::Postgres;
use tokenward_auth::DynTokenStore;
use tracing::{info, instrument};

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use access_token::AccessTokenStorage;
pub use config::PostgresConfig;
pub use refresh_token::RefreshTokenStorage;
pub use store::PgTokenStore;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during token storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record already exists (conflict).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connection settings are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Maps a failed insert to `Conflict` when it hit a unique constraint.
pub(crate) fn conflict_on_unique(e: sqlx_core::Error, what: &str) -> StorageError {
    if let sqlx_core::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StorageError::conflict(format!("{what} already exists"));
    }
    StorageError::from(e)
}

/// Converts a row limit to the `BIGINT` bound into `LIMIT`.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// =============================================================================
// PostgreSQL Token Storage
// =============================================================================

/// PostgreSQL storage backend for token records.
///
/// Holds a connection pool and hands out the table-specific storage types.
#[derive(Debug, Clone)]
pub struct PostgresTokenStorage {
    pool: Arc<PgPool>,
}

impl PostgresTokenStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connects to the token database.
    ///
    /// Validates `config`, opens the pool and, if `run_migrations` is set,
    /// brings the token tables up to date.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the settings are unusable
    /// - `Database` if no connection can be established
    /// - `Migration` if the schema cannot be updated
    #[instrument(skip(config), fields(url = %config.masked_url()))]
    pub async fn from_config(config: &PostgresConfig) -> StorageResult<Self> {
        config.validate()?;

        let pool = PoolOptions::<Postgres>::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        info!(pool_size = config.pool_size, "Connected to token database");

        let storage = Self::new(Arc::new(pool));
        if config.run_migrations {
            storage.migrate().await?;
        }
        Ok(storage)
    }

    /// Applies pending token table migrations.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Migration` if a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        migrations::run(&self.pool).await
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get refresh token storage operations.
    #[must_use]
    pub fn refresh_tokens(&self) -> RefreshTokenStorage<'_> {
        RefreshTokenStorage::new(&self.pool)
    }

    /// Get access token storage operations.
    #[must_use]
    pub fn access_tokens(&self) -> AccessTokenStorage<'_> {
        AccessTokenStorage::new(&self.pool)
    }

    /// Get a shareable [`TokenStore`](tokenward_auth::TokenStore) for the
    /// token engine.
    #[must_use]
    pub fn token_store(&self) -> DynTokenStore {
        Arc::new(PgTokenStore::new(self.clone()))
    }
}

// =============================================================================
// Tests
// =============================================================================
