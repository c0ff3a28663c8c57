//! Configuration management for the Traffic Graph system.
//!
//! Configuration is loaded in layers:
//! 1. `config/default.toml` (base settings)
//! 2. `config/{TRAFFIC_GRAPH_ENV}.toml` (environment-specific)
//! 3. Environment variables with the `TRAFFIC_GRAPH` prefix
//!    (e.g. `TRAFFIC_GRAPH__FINDER__MIN_SAMPLES=3`)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Storage backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the RocksDB database directory.
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/traffic-graph"),
        }
    }
}

/// Finder pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Directory where raster artifacts are written (overwritten each run).
    pub output_dir: PathBuf,
    /// Minimum neighborhood size for DBSCAN. The k of the k-distance
    /// profile is always this same value (the two must stay coupled).
    pub min_samples: usize,
    /// Whether to pause for the epsilon confirmation prompt.
    pub interactive: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data/finder"),
            min_samples: 2,
            interactive: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub finder: FinderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from files and environment.
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var("TRAFFIC_GRAPH_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("TRAFFIC_GRAPH").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings, failing fast on values the pipeline cannot use.
    pub fn validate(&self) -> CoreResult<()> {
        if self.finder.min_samples < 2 {
            return Err(CoreError::ConfigError(format!(
                "finder.min_samples must be >= 2, got {}; density clustering is undefined below 2",
                self.finder.min_samples
            )));
        }
        if self.storage.db_path.as_os_str().is_empty() {
            return Err(CoreError::ConfigError(
                "storage.db_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.finder.min_samples, 2);
        assert!(config.finder.interactive);
    }

    #[test]
    fn test_min_samples_below_two_rejected() {
        for bad in [0, 1] {
            let mut config = Config::default();
            config.finder.min_samples = bad;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("min_samples"), "got: {err}");
        }
    }

    #[test]
    fn test_empty_db_path_rejected() {
        let mut config = Config::default();
        config.storage.db_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = Config::default();
        let toml = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&toml).unwrap();
        assert_eq!(back.finder.min_samples, config.finder.min_samples);
    }
}
