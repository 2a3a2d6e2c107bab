//! Run command implementation
//!
//! Starts the monitor against the cluster and keeps it running until the
//! process receives SIGINT or SIGTERM.

use super::load_config;
use crate::error::Result;
use crate::services::Monitor;
use crate::watch::KubePlatform;

use std::path::Path;
use std::sync::Arc;

/// Execute the run command
pub fn run_monitor(config_path: Option<&Path>, kubeconfig: Option<&Path>) -> Result<()> {
    let (_, config) = load_config(config_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let platform = Arc::new(KubePlatform::connect(kubeconfig).await?);
        let mut monitor = Monitor::new(&config, platform)?;
        monitor.start().await?;

        let signal = wait_for_signal().await;
        monitor.shutdown().await;
        signal
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            log::info!("received SIGINT");
        }
        _ = terminate.recv() => log::info!("received SIGTERM"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    log::info!("received Ctrl-C");
    Ok(())
}
