//! Application configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `tokenward.toml` (or the file given with `--config`)
//! 3. `TOKENWARD__*` environment variables, e.g.
//!    `TOKENWARD__TOKENS__ACCESS_TOKEN_VALIDITY=5m` or
//!    `TOKENWARD__STORAGE__POSTGRES__URL=postgres://...`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use tokenward_auth::TokenEngineConfig;
use tokenward_auth_postgres::PostgresConfig;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tokenward.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tokens: TokenEngineConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn,tokenward=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<()> {
        self.tokens
            .validate()
            .context("invalid [tokens] configuration")?;

        if self.storage.backend == StorageBackend::Postgres {
            self.storage
                .postgres
                .validate()
                .context("invalid [storage.postgres] configuration")?;
        }

        Ok(())
    }
}

/// Loads configuration from `path` (or the default file) and the environment.
///
/// A missing file is not an error; defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut builder = Config::builder();
    if path.exists() {
        builder = builder.add_source(File::from(path.clone()));
    }
    builder = builder.add_source(
        Environment::with_prefix("TOKENWARD")
            .try_parsing(true)
            .separator("__"),
    );

    build(builder).with_context(|| format!("failed to load configuration ({})", path.display()))
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig> {
    let cfg: AppConfig = builder
        .build()
        .context("config build error")?
        .try_deserialize()
        .context("config deserialize error")?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use std::time::Duration;

    fn from_toml(toml: &str) -> Result<AppConfig> {
        build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let cfg = from_toml("").unwrap();
        assert_eq!(cfg.tokens, TokenEngineConfig::default());
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.logging.level, "warn,tokenward=info");
    }

    #[test]
    fn test_humantime_durations() {
        let cfg = from_toml(
            r#"
            [tokens]
            access_token_validity = "5m"
            token_grace_period = "10s"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.tokens.access_token_validity, Duration::from_secs(300));
        assert_eq!(cfg.tokens.token_grace_period, Duration::from_secs(10));
        assert_eq!(
            cfg.tokens.refresh_token_validity,
            TokenEngineConfig::default().refresh_token_validity
        );
    }

    #[test]
    fn test_postgres_backend() {
        let cfg = from_toml(
            r#"
            [storage]
            backend = "postgres"

            [storage.postgres]
            url = "postgres://tokens:secret@db/tokens"
            pool_size = 4
            acquire_timeout = "2s"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
        assert_eq!(cfg.storage.postgres.pool_size, 4);
        assert_eq!(cfg.storage.postgres.acquire_timeout, Duration::from_secs(2));
        assert!(cfg.storage.postgres.run_migrations);
    }

    #[test]
    fn test_invalid_token_windows_rejected() {
        let result = from_toml(
            r#"
            [tokens]
            refresh_token_validity = "1d"
            refresh_token_refresh_threshold = "2d"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_postgres_without_url_rejected() {
        let result = from_toml(
            r#"
            [storage]
            backend = "postgres"

            [storage.postgres]
            url = ""
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = from_toml(
            r#"
            [storage]
            backend = "redis"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let rendered = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(rendered.contains("[tokens]"));
        assert!(rendered.contains("access_token_validity = \"15m\""));
    }
}
