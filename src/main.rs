//! hpa-reporter - HorizontalPodAutoscaler threshold reporter
//!
//! Watches HPAs in a Kubernetes cluster and reports workloads whose replica
//! count reaches a configured threshold or their replica ceiling.

use clap::Parser;
use hpa_reporter::cli::args::{generate_completions, Cli, Commands};
use hpa_reporter::commands::{run_monitor, run_validate};
use hpa_reporter::error::{AppError, ConfigError, WatchError};

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over LOG_LEVEL, --verbose over both
    let default_filter = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    cli.logger(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match cli.selected_command() {
        Commands::Run => run_monitor(cli.config.as_deref(), cli.kubeconfig_path()),

        Commands::Validate => run_validate(cli.config.as_deref(), cli.format),

        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Pass the configuration with --config <path>");
            eprintln!("      or set HPA_REPORTER_CONFIG.");
        }
        AppError::Watch(WatchError::ClientFailure(_)) => {
            eprintln!();
            eprintln!("Hint: Set KUBECONFIG or --kubeconfig when running outside a cluster.");
        }
        AppError::Watch(WatchError::UnsupportedVersion { .. }) => {
            eprintln!();
            eprintln!("Hint: Known autoscaling versions are v1, v2, v2beta1 and v2beta2.");
            eprintln!("      Check 'kubectl api-versions | grep autoscaling'.");
        }
        _ => {}
    }
}
