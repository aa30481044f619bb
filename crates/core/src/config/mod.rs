//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITECACHE_*)
//! 2. TOML config file (if SITECACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CacheNames;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITECACHE_*)
/// 2. TOML config file (if SITECACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache storage database.
    ///
    /// Set via SITECACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the site the worker serves. Requests to any other origin
    /// pass through untouched.
    ///
    /// Set via SITECACHE_SITE_ORIGIN environment variable.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,

    /// Prefix of both cache store names.
    ///
    /// Set via SITECACHE_APP_NAME environment variable.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Cache generation. Changing it orphans every store of the previous
    /// generation; they are deleted at the next activation.
    ///
    /// Set via SITECACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Assets written to the static cache at install, relative to the origin.
    ///
    /// Set via the `precache_assets` array in the TOML config file.
    #[serde(default = "default_precache_assets")]
    pub precache_assets: Vec<String>,

    /// User-Agent string for network requests.
    ///
    /// Set via SITECACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP transport timeout in milliseconds.
    ///
    /// Set via SITECACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sitecache.sqlite")
}

fn default_site_origin() -> String {
    "http://localhost:8080".into()
}

fn default_app_name() -> String {
    "baby".into()
}

fn default_cache_version() -> String {
    "v4".into()
}

fn default_precache_assets() -> Vec<String> {
    vec!["index.html".into(), "styles.css".into(), "favicon.svg".into()]
}

fn default_user_agent() -> String {
    "sitecache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            site_origin: default_site_origin(),
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            precache_assets: default_precache_assets(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SITECACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SITECACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed site origin, reduced to scheme, host and port.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `site_origin` is not an http(s) URL with a host.
    pub fn origin(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { field: "site_origin".into(), reason };

        let parsed = Url::parse(self.site_origin.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme: {}", parsed.scheme())));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }

        Url::parse(&parsed.origin().ascii_serialization()).map_err(|e| invalid(e.to_string()))
    }

    /// Build the worker's explicit configuration from the loaded values.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        self.validate()?;
        Ok(WorkerConfig {
            origin: self.origin()?,
            names: CacheNames::new(&self.app_name, &self.cache_version),
            precache: self.precache_assets.clone(),
        })
    }
}

/// Everything the worker needs to know about its deployment.
///
/// Passed explicitly into the worker so tests can run distinct cache
/// generations side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// The only origin whose requests are cached.
    pub origin: Url,
    /// Current generation of store names.
    pub names: CacheNames,
    /// Assets fetched into the static cache at install, relative to `origin`.
    pub precache: Vec<String>,
}

impl WorkerConfig {
    pub fn new(origin: Url, app: &str, version: &str, precache: Vec<String>) -> Self {
        Self { origin, names: CacheNames::new(app, version), precache }
    }
}
