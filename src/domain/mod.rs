//! Domain models for hpa-reporter
//!
//! Workload identity, the threshold policy and the normalized observation
//! every schema version is mapped into.

pub mod observation;
pub mod workload;

pub use observation::Observation;
pub use workload::{ThresholdPolicy, WorkloadKey};
