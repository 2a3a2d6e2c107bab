//! Workload identity and threshold policy
//!
//! A workload is identified by the namespace and name of its
//! HorizontalPodAutoscaler. The threshold policy maps monitored workloads to
//! the replica count at which they start raising warnings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identity of a monitored workload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadKey {
    namespace: String,
    name: String,
}

impl WorkloadKey {
    /// Create a new workload key
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Namespace of the workload
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the workload
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Read-only mapping from workload to warning threshold
///
/// Built once at startup and shared behind an `Arc`; there is no way to add
/// or remove entries after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdPolicy {
    thresholds: HashMap<WorkloadKey, i32>,
}

impl ThresholdPolicy {
    /// Build a policy from `(key, threshold)` entries
    ///
    /// A key listed more than once keeps its last threshold.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (WorkloadKey, i32)>,
    {
        Self {
            thresholds: entries.into_iter().collect(),
        }
    }

    /// Warning threshold for a workload, `None` if it is not monitored
    #[inline]
    pub fn threshold(&self, key: &WorkloadKey) -> Option<i32> {
        self.thresholds.get(key).copied()
    }

    /// Whether a workload is monitored
    #[inline]
    pub fn contains(&self, key: &WorkloadKey) -> bool {
        self.thresholds.contains_key(key)
    }

    /// Number of monitored workloads
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Whether no workload is monitored
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Entries sorted by workload key
    pub fn entries(&self) -> Vec<(&WorkloadKey, i32)> {
        let mut entries: Vec<_> = self.thresholds.iter().map(|(k, v)| (k, *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
