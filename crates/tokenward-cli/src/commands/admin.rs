use anyhow::{Context, Result};
use tokenward_auth_postgres::PostgresTokenStorage;

use crate::config::{AppConfig, StorageBackend};
use crate::output::print_success;

pub async fn migrate(cfg: &AppConfig) -> Result<()> {
    if cfg.storage.backend == StorageBackend::Memory {
        print_success("In-memory backend has no schema; nothing to migrate");
        return Ok(());
    }

    let postgres = cfg.storage.postgres.clone().with_run_migrations(false);
    let storage = PostgresTokenStorage::from_config(&postgres)
        .await
        .context("failed to connect to PostgreSQL")?;
    storage.migrate().await?;
    print_success(&format!("Migrations applied to {}", postgres.masked_url()));
    Ok(())
}

pub fn show_config(cfg: &AppConfig) -> Result<()> {
    let mut shown = cfg.clone();
    shown.storage.postgres.url = cfg.storage.postgres.masked_url();
    let rendered = toml::to_string_pretty(&shown).context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
