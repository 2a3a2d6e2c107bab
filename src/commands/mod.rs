//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod run;
pub mod validate;

pub use run::run_monitor;
pub use validate::run_validate;

use crate::config::{AppConfig, ConfigFile};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Load the configuration from `path`, or from the default locations
pub fn load_config(path: Option<&Path>) -> Result<(PathBuf, AppConfig)> {
    let loaded = match path {
        Some(path) => (path.to_path_buf(), ConfigFile::load(path)?),
        None => ConfigFile::load_default()?,
    };
    log::info!("[config] loaded {}", loaded.0.display());
    Ok(loaded)
}
