//! Alert system domain types
//!
//! Defines the severity levels and the immutable alert handed to delivery
//! workers.

use crate::domain::{Observation, WorkloadKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format used when rendering the last scale time
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Workload crossed its early-warning threshold
    Warning,
    /// Workload reached its replica ceiling
    Critical,
}

impl AlertSeverity {
    /// Lowercase level name as shown in rendered alerts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Classify a replica count
    ///
    /// Saturation is checked first, so a threshold equal to the ceiling is
    /// still reported as critical.
    pub fn classify(current_replicas: i32, max_replicas: i32, threshold: i32) -> Option<Self> {
        if current_replicas >= max_replicas {
            Some(Self::Critical)
        } else if current_replicas >= threshold {
            Some(Self::Warning)
        } else {
            None
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Alert handed to the fan-out hub
///
/// Shared read-only between every delivery worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert severity
    pub severity: AlertSeverity,
    /// Workload that crossed a threshold
    pub workload: WorkloadKey,
    /// Replica count at the time of the notification
    pub current_replicas: i32,
    /// Configured replica ceiling
    pub max_replicas: i32,
    /// Last time the autoscaler scaled the workload
    pub time: Option<DateTime<Utc>>,
}

impl Alert {
    /// Build an alert from an observation
    pub fn from_observation(severity: AlertSeverity, observation: &Observation) -> Self {
        Self {
            severity,
            workload: observation.key.clone(),
            current_replicas: observation.current_replicas,
            max_replicas: observation.max_replicas,
            time: observation.last_scale_time,
        }
    }

    /// Last scale time rendered with [`TIME_FORMAT`]
    pub fn formatted_time(&self) -> Option<String> {
        self.time.map(|t| t.format(TIME_FORMAT).to_string())
    }

    /// One-line summary: `warning[api/default]: replicas(5/10)`
    pub fn summary(&self) -> String {
        format!(
            "{}[{}/{}]: replicas({}/{})",
            self.severity.as_str(),
            self.workload.name(),
            self.workload.namespace(),
            self.current_replicas,
            self.max_replicas
        )
    }
}
