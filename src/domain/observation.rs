//! Version-agnostic HPA observation

use super::workload::WorkloadKey;
use chrono::{DateTime, Utc};

/// Snapshot of one HPA taken from a single change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Workload the HPA scales
    pub key: WorkloadKey,
    /// `status.currentReplicas`
    pub current_replicas: i32,
    /// `spec.maxReplicas`
    pub max_replicas: i32,
    /// `status.lastScaleTime`, if the HPA has ever scaled
    pub last_scale_time: Option<DateTime<Utc>>,
}

impl Observation {
    /// Create an observation without a last scale time
    pub fn new(key: WorkloadKey, current_replicas: i32, max_replicas: i32) -> Self {
        Self {
            key,
            current_replicas,
            max_replicas,
            last_scale_time: None,
        }
    }

    /// Set the last scale time
    pub fn with_last_scale_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_scale_time = Some(time);
        self
    }
}
