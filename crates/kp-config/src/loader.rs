//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "keyprov.toml",
    "config.toml",
    "./config/keyprov.toml",
    "/etc/keyprov/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader that must read the given config file
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_env_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// An explicit path or `KEYPROV_CONFIG` is returned even if missing so
    /// that loading fails with `ReadError`; only the standard paths are probed.
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            return Some(path.clone());
        }

        if let Ok(path) = env::var("KEYPROV_CONFIG") {
            return Some(PathBuf::from(path));
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply KEYPROV_* overrides. Unparseable numeric values are ignored.
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // MongoDB
    if let Some(val) = lookup("KEYPROV_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("KEYPROV_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }
    if let Some(val) = lookup("KEYPROV_MONGODB_ENSURE_INDEXES") {
        config.mongodb.ensure_indexes = val.parse().unwrap_or(true);
    }

    // Provisioning
    if let Some(val) = lookup("KEYPROV_DEFAULT_EXPIRATION_DAYS") {
        if let Ok(days) = val.parse() {
            config.provisioning.default_expiration_days = days;
        }
    }
    if let Some(val) = lookup("KEYPROV_MAX_CONFLICT_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.provisioning.max_conflict_retries = retries;
        }
    }
    if let Some(val) = lookup("KEYPROV_TOKEN_PREFIX") {
        config.provisioning.token_prefix = val;
    }

    // Analytics
    if let Some(val) = lookup("KEYPROV_ANALYTICS_ENABLED") {
        config.analytics.enabled = val.parse().unwrap_or(false);
    }
    if let Some(val) = lookup("KEYPROV_ANALYTICS_ENDPOINT") {
        config.analytics.endpoint = val;
    }
    if let Some(val) = lookup("KEYPROV_ANALYTICS_TRACKING_ID") {
        config.analytics.tracking_id = val;
    }
    if let Some(val) = lookup("KEYPROV_ANALYTICS_APP_NAME") {
        config.analytics.app_name = val;
    }
    if let Some(val) = lookup("KEYPROV_ANALYTICS_APP_VERSION") {
        config.analytics.app_version = val;
    }
    if let Some(val) = lookup("KEYPROV_ANALYTICS_TIMEOUT_MS") {
        if let Ok(timeout) = val.parse() {
            config.analytics.timeout_ms = timeout;
        }
    }
}
