//! Configuration loading for the vector engine.
//!
//! Layered config: defaults -> config file -> env vars -> caller overrides.
//! Default config file lives at `<platform config dir>/semindex/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::metric::DistanceMetric;

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Pairs committed per batch during insertion
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Store over-allocation, as a multiple of the incoming batch length
    #[serde(default = "default_growth_factor")]
    pub growth_factor: usize,

    /// HNSW quality parameter, used for both construction and search
    #[serde(default = "default_ef")]
    pub ef: usize,

    /// HNSW connections per node (M)
    #[serde(default = "default_connectivity")]
    pub connectivity: usize,

    /// Distance metric for the ANN backend
    #[serde(default)]
    pub metric: DistanceMetric,

    /// Where snapshots are written by default
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_batch_size() -> usize {
    2048
}

fn default_growth_factor() -> usize {
    20
}

fn default_ef() -> usize {
    32
}

fn default_connectivity() -> usize {
    16
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_snapshot_path() -> String {
    ProjectDirs::from("", "", "semindex")
        .map(|p| p.data_local_dir().join("index.snapshot.json"))
        .unwrap_or_else(|| PathBuf::from("./index.snapshot.json"))
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            growth_factor: default_growth_factor(),
            ef: default_ef(),
            connectivity: default_connectivity(),
            metric: DistanceMetric::default(),
            snapshot_path: default_snapshot_path(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file (optional)
    /// 3. Caller-specified config file (required if given)
    /// 4. Environment variables (SEMINDEX_*, nested keys joined by `__`)
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "semindex")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("batch_size", default_batch_size() as i64)?
            .set_default("growth_factor", default_growth_factor() as i64)?
            .set_default("ef", default_ef() as i64)?
            .set_default("connectivity", default_connectivity() as i64)?
            .set_default("metric", DistanceMetric::default().as_str())?
            .set_default("snapshot_path", default_snapshot_path())?
            .set_default("log_level", default_log_level())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SEMINDEX_BATCH_SIZE, SEMINDEX_METRIC, ...
        builder = builder.add_source(
            Environment::with_prefix("SEMINDEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.ef == 0 {
            return Err(ConfigError::Invalid {
                field: "ef",
                reason: "must be > 0".to_string(),
            });
        }
        if self.connectivity < 2 {
            return Err(ConfigError::Invalid {
                field: "connectivity",
                reason: format!("must be >= 2, got {}", self.connectivity),
            });
        }
        Ok(())
    }

    /// Snapshot path with a leading `~/` expanded to the home directory
    pub fn expanded_snapshot_path(&self) -> PathBuf {
        if let Some(rest) = self.snapshot_path.strip_prefix("~/") {
            if let Some(base) = directories::BaseDirs::new() {
                return base.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.snapshot_path)
    }
}
