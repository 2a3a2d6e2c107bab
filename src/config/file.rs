//! Configuration file loading
//!
//! Handles loading configuration from YAML or TOML files, chosen by
//! extension.

use crate::config::AppConfig;
use crate::error::ConfigError;

use std::path::{Path, PathBuf};

/// System-wide configuration path
pub const SYSTEM_CONFIG_PATH: &str = "/etc/k8shuginn/config.yaml";

/// Configuration file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            AppConfig::from_toml(&content)?
        } else {
            AppConfig::from_yaml(&content)?
        };

        log::debug!("[config] loaded {}", path.display());
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load_default() -> Result<(PathBuf, AppConfig), ConfigError> {
        let paths = Self::default_paths();
        for path in &paths {
            if path.exists() {
                let config = Self::load(path)?;
                return Ok((path.clone(), config));
            }
        }

        let searched: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        Err(ConfigError::FileNotFound(searched.join(", ")))
    }

    /// Get default configuration file paths
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hpa-reporter").join("config.yaml"));
        }

        paths.push(PathBuf::from("hpa-reporter.yaml"));
        paths.push(PathBuf::from("hpa-reporter.toml"));

        paths
    }
}
