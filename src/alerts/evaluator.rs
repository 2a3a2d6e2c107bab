//! Threshold evaluation
//!
//! Turns HPA update notifications into alerts. Evaluation looks only at the
//! new observation and the policy; nothing is remembered between calls.

use super::types::{Alert, AlertSeverity};
use crate::domain::{Observation, ThresholdPolicy};
use crate::watch::{normalize, HpaEventHandler, HpaVersion, RawHpa};
use std::sync::Arc;

/// Receiver of alerts produced by the evaluator
///
/// `report` is called from the watch task and must return without waiting
/// on delivery.
pub trait AlertSink: Send + Sync {
    fn report(&self, alert: Alert);
}

/// Evaluates observations against the threshold policy
pub struct ThresholdEvaluator {
    version: HpaVersion,
    policy: Arc<ThresholdPolicy>,
    sink: Arc<dyn AlertSink>,
}

impl ThresholdEvaluator {
    /// Create an evaluator for payloads of `version`
    pub fn new(
        version: HpaVersion,
        policy: Arc<ThresholdPolicy>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            version,
            policy,
            sink,
        }
    }

    /// Decide whether an observation raises an alert
    ///
    /// Unmonitored workloads never alert.
    pub fn evaluate(&self, observation: &Observation) -> Option<Alert> {
        let threshold = self.policy.threshold(&observation.key)?;
        let severity = AlertSeverity::classify(
            observation.current_replicas,
            observation.max_replicas,
            threshold,
        )?;
        Some(Alert::from_observation(severity, observation))
    }

    fn monitored(&self, obj: &RawHpa) -> Option<String> {
        let key = obj.key().ok()?;
        self.policy.contains(&key).then(|| key.to_string())
    }
}

impl HpaEventHandler for ThresholdEvaluator {
    fn on_add(&self, obj: &RawHpa, is_initial_list: bool) {
        if let Some(key) = self.monitored(obj) {
            log::debug!(
                "[collector] hpa detected: {} (initial list: {})",
                key,
                is_initial_list
            );
        }
    }

    fn on_update(&self, _old: &RawHpa, new: &RawHpa) {
        let observation = match normalize(self.version, new) {
            Ok(observation) => observation,
            Err(e) => {
                log::error!("[collector] failed to read hpa: {}", e);
                return;
            }
        };

        if let Some(alert) = self.evaluate(&observation) {
            log::debug!("[collector] {}", alert.summary());
            self.sink.report(alert);
        }
    }

    fn on_delete(&self, obj: &RawHpa) {
        if let Some(key) = self.monitored(obj) {
            log::debug!("[collector] hpa disappeared: {}", key);
        }
    }
}
