//! Configuration module for the watch engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DW_` and use double
//! underscores to separate nested levels:
//! - `DW_WATCH__CHANNEL_CAPACITY=512` sets `watch.channel_capacity`
//! - `DW_WATCH__POLL_INTERVAL_MS=50` sets `watch.poll_interval_ms`
//! - `DW_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Watch engine tuning
    #[serde(default)]
    pub watch: WatchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Capacity of the per-handle event channel. Events arriving while the
    /// channel is full are dropped, like an OS buffer overflow.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Polling sensitivity hint in milliseconds, passed to the backend.
    /// Only honored on platforms where notify falls back to polling.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level filter
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_channel_capacity() -> usize {
    100
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".dirwatch/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with DW_ prefix.
            // Double underscore separates nested levels; single underscores
            // stay part of the field name.
            .merge(
                Env::prefixed("DW_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("DW_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for a .dirwatch directory,
    /// searching from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".dirwatch");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.version, 1);
        assert_eq!(settings.watch.channel_capacity, 100);
        assert_eq!(settings.watch.poll_interval_ms, 100);
        assert_eq!(settings.logging.default, "warn");
        assert!(settings.logging.modules.is_empty());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("settings.toml");
        std::fs::write(
            &config_path,
            r#"
[watch]
channel_capacity = 512

[logging]
default = "info"

[logging.modules]
dirwatch = "debug"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        assert_eq!(settings.watch.channel_capacity, 512);
        // Unset fields keep their defaults
        assert_eq!(settings.watch.poll_interval_ms, 100);
        assert_eq!(settings.logging.default, "info");
        assert_eq!(
            settings.logging.modules.get("dirwatch").map(String::as_str),
            Some("debug")
        );
    }

    #[test]
    fn test_load_from_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();

        let settings = Settings::load_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.watch.channel_capacity, 100);
        assert_eq!(settings.logging.default, "warn");
    }
}
