//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (handled by the binary's clap layer)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::Result;

/// Default keepalive interval for subscriber streams, in seconds
pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Keepalive interval for idle subscriber streams (seconds)
    pub keepalive_interval_secs: u64,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: default_database_path(),
            keepalive_interval_secs: DEFAULT_KEEPALIVE_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration with env-over-file-over-default priority
    pub fn load() -> Result<Self> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(&path)?;
                toml::from_str(&text)
                    .map_err(|e| crate::Error::Config(format!("{}: {e}", path.display())))?
            }
            // Missing config file is not an error: start with defaults
            _ => EngineConfig::default(),
        };

        if let Ok(path) = std::env::var("CRS_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(secs) = std::env::var("CRS_KEEPALIVE_SECS") {
            config.keepalive_interval_secs = secs
                .parse()
                .map_err(|_| crate::Error::Config(format!("invalid CRS_KEEPALIVE_SECS: {secs}")))?;
        }

        Ok(config)
    }

    /// Keepalive interval as a `Duration`
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}

/// Config file location: $CRS_CONFIG, else ~/.config/crs/config.toml
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CRS_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("crs").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crs")
        .join("crs.db")
}
