use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::gate::FilterConfig;
use crate::core::quota::SurfingPolicy;

/// Top-level plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub publish: PublishConfig,
    pub surfing: SurfingPolicy,
    pub filter: FilterConfig,
    pub data: DataConfig,
}

/// Scheduled publication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Batch size passed through to the wire client.
    pub per_qzone_num: u32,
    /// Crontab expression for the auto-publish trigger.
    pub publish_cron: String,
    /// Length bound for scheduled posts, in chars.
    pub max_length: usize,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            publish: PublishConfig::default(),
            surfing: SurfingPolicy::default(),
            filter: FilterConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            per_qzone_num: 5,
            publish_cron: "45 1 * * *".to_string(),
            max_length: 500,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/qzone-autopost/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("qzone-autopost"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("qzone-autopost").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
