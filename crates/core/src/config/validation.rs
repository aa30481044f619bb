//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Cache names end up as store keys; keep them to one visible token.
fn check_token(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must not contain whitespace".into() });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `app_name` or `cache_version` is empty or contains whitespace
    /// - `site_origin` is not an http(s) URL with a host
    /// - any `precache_assets` entry is blank
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_token("app_name", &self.app_name)?;
        check_token("cache_version", &self.cache_version)?;

        self.origin()?;

        if self.precache_assets.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "precache_assets".into(),
                reason: "entries must not be empty".into(),
            });
        }
        if self.precache_assets.is_empty() {
            tracing::warn!("precache_assets is empty; the static cache will stay empty");
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
