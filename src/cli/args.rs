//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// HorizontalPodAutoscaler threshold reporter
///
/// Watches HPAs and reports workloads approaching their replica ceiling.
#[derive(Parser, Debug)]
#[command(name = "hpa-reporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file (YAML, or TOML by extension)
    #[arg(
        short,
        long,
        global = true,
        alias = "app.config",
        env = "HPA_REPORTER_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// Path to kubeconfig; in-cluster credentials are used when unset or empty
    #[arg(
        long,
        global = true,
        env = "KUBECONFIG",
        value_parser = OsStringValueParser::new().map(PathBuf::from)
    )]
    pub kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Selected subcommand, `run` when none was given
    pub fn selected_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Kubeconfig to load; an empty value means in-cluster
    pub fn kubeconfig_path(&self) -> Option<&Path> {
        self.kubeconfig
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Logger for this invocation
    ///
    /// `env` supplies the filter (`RUST_LOG`, then the default level);
    /// `--verbose` raises it to debug regardless.
    pub fn logger(&self, env: env_logger::Env<'_>) -> env_logger::Builder {
        let mut builder = env_logger::Builder::from_env(env);
        if self.verbose {
            builder.filter_level(LevelFilter::Debug);
        }
        builder
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch HPAs and report threshold crossings until interrupted
    Run,

    /// Load the configuration and print the parsed policy
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
