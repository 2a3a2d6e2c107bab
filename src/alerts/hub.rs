//! Fan-out hub
//!
//! Owns the delivery workers and the shutdown signal they share. One call to
//! [`FanoutHub::dispatch`] hands the same alert to every worker.

use super::evaluator::AlertSink;
use super::notifier::{build_notifiers, Notifier};
use super::types::Alert;
use super::worker::DeliveryWorker;
use crate::config::ReporterConfig;
use crate::error::ConfigError;
use std::sync::Arc;
use tokio::sync::watch;

/// Dispatches alerts to every delivery worker
pub struct FanoutHub {
    workers: Vec<DeliveryWorker>,
    shutdown_tx: watch::Sender<bool>,
}

impl FanoutHub {
    /// Create a hub with no workers
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            workers: Vec::new(),
            shutdown_tx,
        }
    }

    /// Spawn a worker for a notifier
    ///
    /// Must be called from within a tokio runtime, before the hub is shared.
    pub fn add_notifier(&mut self, notifier: Box<dyn Notifier>) {
        let worker = DeliveryWorker::spawn(notifier, self.shutdown_tx.subscribe());
        self.workers.push(worker);
    }

    /// Build a hub with one worker per configured reporter
    ///
    /// If any reporter fails to build, no worker is left running.
    pub fn from_config(config: &ReporterConfig) -> Result<Self, ConfigError> {
        let notifiers = build_notifiers(config)?;

        let mut hub = Self::new();
        for notifier in notifiers {
            hub.add_notifier(notifier);
        }

        log::info!("[reporter] {} reporters started", hub.worker_count());
        Ok(hub)
    }

    /// Hand an alert to every worker without waiting for delivery
    ///
    /// Returns the number of workers that accepted it.
    pub fn dispatch(&self, alert: Alert) -> usize {
        let alert = Arc::new(alert);
        self.workers
            .iter()
            .filter(|worker| worker.report(Arc::clone(&alert)))
            .count()
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Workers in creation order
    pub fn workers(&self) -> &[DeliveryWorker] {
        &self.workers
    }

    /// Whether shutdown has been signalled
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Signal every worker to stop and wait for them to exit
    ///
    /// A second call only waits.
    pub async fn shutdown(&self) {
        let first = self.shutdown_tx.send_if_modified(|stop| {
            if *stop {
                false
            } else {
                *stop = true;
                true
            }
        });
        if first {
            log::info!("[reporter] shutting down {} reporters", self.workers.len());
        }

        for worker in &self.workers {
            worker.join().await;
        }
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for FanoutHub {
    fn report(&self, alert: Alert) {
        let accepted = self.dispatch(alert);
        if accepted < self.workers.len() {
            log::debug!(
                "[reporter] alert accepted by {} of {} reporters",
                accepted,
                self.workers.len()
            );
        }
    }
}
