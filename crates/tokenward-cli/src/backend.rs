use anyhow::{Context, Result};
use tokenward_auth::{DynTokenStore, TokenService};
use tokenward_auth_postgres::PostgresTokenStorage;
use tracing::{info, warn};

use crate::config::{AppConfig, StorageBackend};

/// Opens the configured token store.
pub async fn open_store(cfg: &AppConfig) -> Result<DynTokenStore> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory backend; tokens are discarded when the process exits");
            Ok(tokenward_db_memory::create_token_store())
        }
        StorageBackend::Postgres => {
            let storage = PostgresTokenStorage::from_config(&cfg.storage.postgres)
                .await
                .context("failed to open PostgreSQL token store")?;
            info!("PostgreSQL token store ready");
            Ok(storage.token_store())
        }
    }
}

/// Builds a token service over the configured store.
pub async fn token_service(cfg: &AppConfig) -> Result<TokenService> {
    let store = open_store(cfg).await?;
    TokenService::with_system_clock(store, cfg.tokens.clone()).context("invalid token configuration")
}
