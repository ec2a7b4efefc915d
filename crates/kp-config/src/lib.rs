//! Keyprov Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub provisioning: ProvisioningConfig,
    pub analytics: AnalyticsConfig,
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    /// Create the unique indexes on startup
    pub ensure_indexes: bool,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "keyprov".to_string(),
            ensure_indexes: true,
        }
    }
}

/// Provisioning workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Expiration horizon used when the caller gives none (0 = never expires)
    pub default_expiration_days: i64,
    /// How many times the whole sequence is re-run after a write conflict
    pub max_conflict_retries: u32,
    /// Prefix prepended to generated tokens
    pub token_prefix: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            default_expiration_days: 0,
            max_conflict_retries: 3,
            token_prefix: "kp_".to_string(),
        }
    }
}

/// Usage analytics forwarder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub tracking_id: String,
    pub app_name: String,
    pub app_version: String,
    pub timeout_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            tracking_id: String::new(),
            app_name: "keyprov".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mongodb.uri.trim().is_empty() {
            return Err(ConfigError::ValidationError("mongodb.uri must not be empty".to_string()));
        }
        if self.mongodb.database.trim().is_empty() {
            return Err(ConfigError::ValidationError("mongodb.database must not be empty".to_string()));
        }
        if self.analytics.enabled {
            if self.analytics.endpoint.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "analytics.endpoint is required when analytics is enabled".to_string(),
                ));
            }
            if self.analytics.tracking_id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "analytics.tracking_id is required when analytics is enabled".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Keyprov Configuration
# Environment variables (KEYPROV_*) override these settings

[mongodb]
uri = "mongodb://localhost:27017"
database = "keyprov"
ensure_indexes = true

[provisioning]
default_expiration_days = 0  # 0 or negative = never expires
max_conflict_retries = 3
token_prefix = "kp_"

[analytics]
enabled = false
endpoint = ""
tracking_id = ""
app_name = "keyprov"
app_version = "0.1.0"
timeout_ms = 2000
"#
        .to_string()
    }
}
