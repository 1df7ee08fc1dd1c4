//! Configuration management for Dorkfind.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{DorkError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable overriding `store.url`
pub const ENV_STORE_URL: &str = "DORKFIND_STORE_URL";
/// Environment variable overriding `store.api_key`
pub const ENV_STORE_KEY: &str = "DORKFIND_STORE_KEY";

/// Main configuration structure for Dorkfind.
///
/// ## Example Configuration File (dorkfind.toml)
///
/// ```toml
/// [general]
/// log_level = "info"
///
/// [server]
/// bind = "127.0.0.1:8787"
///
/// [store]
/// kind = "postgrest"
/// url = "https://project.supabase.co"
/// table = "dorks"
///
/// [dispatch]
/// quiet_ms = 500
/// endpoint = "http://127.0.0.1:8787"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Record store selection and connection
    pub store: StoreConfig,

    /// Client-side dispatch tuning
    pub dispatch: DispatchConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the search endpoint listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Which record store backs the search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Records held in memory, optionally seeded from a JSON file
    #[default]
    Memory,

    /// A PostgREST table (e.g. a hosted Postgres `dorks` table)
    Postgrest,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Postgrest => write!(f, "postgrest"),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// JSON array of records loaded into the memory store
    pub seed_path: Option<PathBuf>,

    /// Base URL of the PostgREST service
    pub url: Option<String>,

    /// API key sent as `apikey` and bearer token
    pub api_key: Option<String>,

    /// Table holding the records
    pub table: String,

    /// Per-request timeout for remote stores
    pub timeout_ms: u64,

    /// Record count above which the memory store scans in parallel
    pub parallel_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            kind: StoreKind::Memory,
            seed_path: None,
            url: None,
            api_key: None,
            table: "dorks".to_string(),
            timeout_ms: 5000,
            parallel_threshold: 10000,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Query dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How long input must stay unchanged before a search is sent
    pub quiet_ms: u64,

    /// Base URL of a running search endpoint (None = search in-process)
    pub endpoint: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            quiet_ms: 500,
            endpoint: None,
        }
    }
}

impl DispatchConfig {
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_ms)
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| DorkError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| DorkError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "dorkfind").ok_or_else(|| DorkError::ConfigError {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("dorkfind.toml"))
    }

    /// Apply `DORKFIND_STORE_URL` / `DORKFIND_STORE_KEY` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply store overrides using `lookup` to resolve variable names.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.is_empty()) {
            debug!(var = ENV_STORE_URL, "Store URL overridden from environment");
            self.store.url = Some(url);
        }
        if let Some(key) = lookup(ENV_STORE_KEY).filter(|v| !v.is_empty()) {
            self.store.api_key = Some(key);
        }
    }
}
