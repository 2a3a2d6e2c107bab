//! HPA monitor
//!
//! Wires the reporters, the watcher and the threshold evaluator together and
//! owns the shutdown sequence.

use crate::alerts::{AlertSink, FanoutHub, ThresholdEvaluator};
use crate::config::AppConfig;
use crate::domain::ThresholdPolicy;
use crate::error::{AppError, WatchError};
use crate::watch::{HpaVersion, HpaWatcher, Platform, SubscriptionHandle};

use std::sync::Arc;

/// Running alert pipeline
pub struct Monitor<P: Platform> {
    policy: Arc<ThresholdPolicy>,
    hub: Arc<FanoutHub>,
    watcher: HpaWatcher<P>,
    subscription: Option<SubscriptionHandle>,
}

impl<P: Platform> Monitor<P> {
    /// Validate the configuration and start the reporters
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &AppConfig, platform: Arc<P>) -> Result<Self, AppError> {
        let policy = config.threshold_policy()?;
        if policy.is_empty() {
            log::warn!("[collector] no hpa configured, nothing will be reported");
        }
        let hub = FanoutHub::from_config(&config.reporters)?;
        Ok(Self::with_hub(policy, hub, platform))
    }

    /// Build a monitor around an existing hub
    pub fn with_hub(policy: ThresholdPolicy, hub: FanoutHub, platform: Arc<P>) -> Self {
        Self {
            policy: Arc::new(policy),
            hub: Arc::new(hub),
            watcher: HpaWatcher::new(platform),
            subscription: None,
        }
    }

    /// Resolve the HPA version, register the evaluator and start watching
    ///
    /// On failure the reporters are shut down before the error is returned.
    /// Calling it again while running fails without touching the reporters.
    pub async fn start(&mut self) -> Result<HpaVersion, AppError> {
        if self.subscription.is_some() {
            return Err(WatchError::Subscription("monitor already started".to_string()).into());
        }

        match self.try_start().await {
            Ok(version) => {
                log::info!(
                    "[collector] monitoring {} hpa at autoscaling/{}",
                    self.policy.len(),
                    version
                );
                Ok(version)
            }
            Err(e) => {
                self.hub.shutdown().await;
                Err(e)
            }
        }
    }

    async fn try_start(&mut self) -> Result<HpaVersion, AppError> {
        let version = self.watcher.resolve().await?;

        let sink: Arc<dyn AlertSink> = self.hub.clone();
        let evaluator = Arc::new(ThresholdEvaluator::new(
            version,
            Arc::clone(&self.policy),
            sink,
        ));
        let handle = self.watcher.subscribe(version, evaluator)?;

        if let Err(e) = self.watcher.start() {
            if let Err(stop_err) = self.watcher.stop(handle).await {
                log::error!("[collector] {}", stop_err);
            }
            return Err(e.into());
        }

        self.subscription = Some(handle);
        Ok(version)
    }

    /// Stop the watcher, then the reporters
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.subscription.take() {
            log::info!("[collector] shutting down");
            if let Err(e) = self.watcher.stop(handle).await {
                log::error!("[collector] {}", e);
            }
        }
        self.hub.shutdown().await;
    }

    /// Version the watcher is subscribed at
    pub fn version(&self) -> Option<HpaVersion> {
        self.watcher.version()
    }

    /// Whether the watch task is alive
    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    /// Threshold policy in use
    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Reporter hub
    pub fn hub(&self) -> &FanoutHub {
        &self.hub
    }
}
