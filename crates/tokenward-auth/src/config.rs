//! Token engine configuration.
//!
//! All timing windows of the engine live in one immutable struct that is
//! handed to [`TokenService`](crate::token::TokenService) at construction.
//!
//! # Example (TOML)
//!
//! ```toml
//! [tokens]
//! access_token_validity = "15m"
//! refresh_token_validity = "30d"
//! refresh_token_refresh_threshold = "7d"
//! token_grace_period = "30s"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing windows used for issuance, rotation and reuse detection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenEngineConfig {
    /// How long a freshly issued access token is valid.
    #[serde(with = "humantime_serde")]
    pub access_token_validity: Duration,

    /// How long a freshly issued refresh token is valid.
    #[serde(with = "humantime_serde")]
    pub refresh_token_validity: Duration,

    /// Remaining refresh token lifetime below which the refresh token is
    /// proactively replaced.
    #[serde(with = "humantime_serde")]
    pub refresh_token_refresh_threshold: Duration,

    /// How long after its expiry a just-superseded access token is still
    /// tolerated.
    #[serde(with = "humantime_serde")]
    pub token_grace_period: Duration,
}

impl Default for TokenEngineConfig {
    fn default() -> Self {
        Self {
            access_token_validity: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_validity: Duration::from_secs(30 * 24 * 3600), // 30 days
            refresh_token_refresh_threshold: Duration::from_secs(7 * 24 * 3600), // 7 days
            token_grace_period: Duration::from_secs(30),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl TokenEngineConfig {
    /// Sets the access token validity.
    #[must_use]
    pub fn with_access_token_validity(mut self, validity: Duration) -> Self {
        self.access_token_validity = validity;
        self
    }

    /// Sets the refresh token validity.
    #[must_use]
    pub fn with_refresh_token_validity(mut self, validity: Duration) -> Self {
        self.refresh_token_validity = validity;
        self
    }

    /// Sets the refresh token rotation threshold.
    #[must_use]
    pub fn with_refresh_token_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_token_refresh_threshold = threshold;
        self
    }

    /// Sets the access token reuse grace period.
    #[must_use]
    pub fn with_token_grace_period(mut self, grace: Duration) -> Self {
        self.token_grace_period = grace;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A validity or the rotation threshold is zero
    /// - The rotation threshold is not shorter than the refresh token validity
    /// - The grace period is longer than the access token validity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_validity.is_zero() {
            return Err(ConfigError::InvalidValue(
                "access_token_validity must be > 0".to_string(),
            ));
        }

        if self.refresh_token_validity.is_zero() {
            return Err(ConfigError::InvalidValue(
                "refresh_token_validity must be > 0".to_string(),
            ));
        }

        if self.refresh_token_refresh_threshold.is_zero() {
            return Err(ConfigError::InvalidValue(
                "refresh_token_refresh_threshold must be > 0".to_string(),
            ));
        }

        // A threshold at or above the validity would rotate on every refresh.
        if self.refresh_token_refresh_threshold >= self.refresh_token_validity {
            return Err(ConfigError::InvalidValue(format!(
                "refresh_token_refresh_threshold ({:?}) must be shorter than refresh_token_validity ({:?})",
                self.refresh_token_refresh_threshold, self.refresh_token_validity,
            )));
        }

        if self.token_grace_period > self.access_token_validity {
            return Err(ConfigError::InvalidValue(
                "token_grace_period must not exceed access_token_validity".to_string(),
            ));
        }

        Ok(())
    }

    pub(crate) fn access_token_lifetime(&self) -> time::Duration {
        to_time_duration(self.access_token_validity)
    }

    pub(crate) fn refresh_token_lifetime(&self) -> time::Duration {
        to_time_duration(self.refresh_token_validity)
    }

    pub(crate) fn refresh_threshold(&self) -> time::Duration {
        to_time_duration(self.refresh_token_refresh_threshold)
    }

    pub(crate) fn grace_period(&self) -> time::Duration {
        to_time_duration(self.token_grace_period)
    }
}

fn to_time_duration(duration: Duration) -> time::Duration {
    time::Duration::try_from(duration).unwrap_or(time::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TokenEngineConfig::default();
        assert_eq!(config.access_token_validity, Duration::from_secs(900));
        assert_eq!(
            config.refresh_token_validity,
            Duration::from_secs(30 * 24 * 3600)
        );
        assert_eq!(config.token_grace_period, Duration::from_secs(30));
    }

    #[test]
    fn test_default_config_validates() {
        assert!(TokenEngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_access_validity_fails_validation() {
        let config = TokenEngineConfig::default().with_access_token_validity(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_not_below_validity_fails_validation() {
        let config = TokenEngineConfig::default()
            .with_refresh_token_validity(Duration::from_secs(3600))
            .with_refresh_token_refresh_threshold(Duration::from_secs(3600));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_token_refresh_threshold"));
    }

    #[test]
    fn test_grace_longer_than_access_validity_fails_validation() {
        let config = TokenEngineConfig::default()
            .with_access_token_validity(Duration::from_secs(60))
            .with_token_grace_period(Duration::from_secs(61));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_grace_period_is_allowed() {
        let config = TokenEngineConfig::default().with_token_grace_period(Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_time_durations() {
        let config = TokenEngineConfig::default();
        assert_eq!(config.access_token_lifetime(), time::Duration::minutes(15));
        assert_eq!(config.refresh_token_lifetime(), time::Duration::days(30));
        assert_eq!(config.refresh_threshold(), time::Duration::days(7));
        assert_eq!(config.grace_period(), time::Duration::seconds(30));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue("test error".to_string());
        assert_eq!(err.to_string(), "Invalid configuration value: test error");
    }

    #[test]
    fn test_humantime_deserialize() {
        let json = r#"{
            "access_token_validity": "5m",
            "refresh_token_validity": "14days",
            "token_grace_period": "10s"
        }"#;
        let config: TokenEngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.access_token_validity, Duration::from_secs(300));
        assert_eq!(
            config.refresh_token_validity,
            Duration::from_secs(14 * 24 * 3600)
        );
        assert_eq!(config.token_grace_period, Duration::from_secs(10));
        // Unset fields fall back to defaults.
        assert_eq!(
            config.refresh_token_refresh_threshold,
            Duration::from_secs(7 * 24 * 3600)
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = TokenEngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TokenEngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
