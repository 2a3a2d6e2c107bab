//! Validate command implementation
//!
//! Loads the configuration, checks it and prints what would be monitored.

use super::load_config;
use crate::alerts::build_notifiers;
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, ConfigSummary};
use crate::error::Result;
use std::path::Path;

/// Execute the validate command
pub fn run_validate(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let (path, config) = load_config(config_path)?;

    config.threshold_policy()?;
    build_notifiers(&config.reporters)?;

    let summary = ConfigSummary::new(path.display().to_string(), &config);
    print_output(&summary, format)?;

    Ok(())
}
