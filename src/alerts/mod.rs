//! Alert evaluation and delivery
//!
//! Threshold evaluation of HPA updates and fan-out of the resulting alerts to
//! independently running delivery workers.

mod evaluator;
mod hub;
mod notifier;
mod types;
mod worker;

pub use evaluator::{AlertSink, ThresholdEvaluator};
pub use hub::FanoutHub;
pub use notifier::{
    build_notifiers, Notifier, SlackNotifier, StdoutNotifier, DEFAULT_SLACK_TIMEOUT_SECS,
};
pub use types::{Alert, AlertSeverity, TIME_FORMAT};
pub use worker::{DeliveryWorker, WorkerState};
