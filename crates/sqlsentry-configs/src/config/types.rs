// Configuration types
use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration for the pipeline service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub safety: SafetySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            safety: SafetySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Postgres connection URL; overridable via the DATABASE_URL env var
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a request may wait for a pooled connection
    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
        }
    }
}

/// Safety-guard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySettings {
    /// Tables statements may reference. Empty = no allowlist check.
    #[serde(default)]
    pub allowed_tables: Vec<String>,
    /// Extend the allowlist with the live catalog at startup, confining
    /// the agent to tables that actually exist.
    #[serde(default)]
    pub restrict_to_catalog: bool,
    /// Maximum statements accepted in one blob (0 = unlimited)
    #[serde(default = "default_max_statements")]
    pub max_statements: usize,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            allowed_tables: Vec::new(),
            restrict_to_catalog: false,
            max_statements: default_max_statements(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// Per-target level overrides, e.g. `"sql::exec" = "debug"`
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_to_console: true,
            targets: HashMap::new(),
        }
    }
}
