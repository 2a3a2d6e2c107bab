//! Per-version field extraction
//!
//! Every autoscaling version carries `spec.maxReplicas`,
//! `status.currentReplicas` and `status.lastScaleTime`, but not with the same
//! optionality. Each version gets a small adapter that only extracts those
//! fields; everything after this point is version-agnostic.

use super::raw::RawHpa;
use super::version::HpaVersion;
use crate::domain::Observation;
use crate::error::NormalizationError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HpaShape<S> {
    spec: SpecShape,
    status: Option<S>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecShape {
    max_replicas: i32,
}

/// v1, v2beta1 and v2beta2: `currentReplicas` is required once status exists
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequiredStatus {
    current_replicas: i32,
    last_scale_time: Option<DateTime<Utc>>,
}

/// v2: `currentReplicas` is omitted when zero
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionalStatus {
    current_replicas: Option<i32>,
    last_scale_time: Option<DateTime<Utc>>,
}

trait StatusFields {
    fn current_replicas(&self) -> i32;
    fn last_scale_time(&self) -> Option<DateTime<Utc>>;
}

impl StatusFields for RequiredStatus {
    fn current_replicas(&self) -> i32 {
        self.current_replicas
    }

    fn last_scale_time(&self) -> Option<DateTime<Utc>> {
        self.last_scale_time
    }
}

impl StatusFields for OptionalStatus {
    fn current_replicas(&self) -> i32 {
        self.current_replicas.unwrap_or(0)
    }

    fn last_scale_time(&self) -> Option<DateTime<Utc>> {
        self.last_scale_time
    }
}

/// Normalize a raw payload of the given version into an observation
pub fn normalize(version: HpaVersion, raw: &RawHpa) -> Result<Observation, NormalizationError> {
    match version {
        HpaVersion::V1 => from_v1(raw),
        HpaVersion::V2 => from_v2(raw),
        HpaVersion::V2beta1 => from_v2beta1(raw),
        HpaVersion::V2beta2 => from_v2beta2(raw),
    }
}

fn from_v1(raw: &RawHpa) -> Result<Observation, NormalizationError> {
    extract::<RequiredStatus>(HpaVersion::V1, raw)
}

fn from_v2(raw: &RawHpa) -> Result<Observation, NormalizationError> {
    extract::<OptionalStatus>(HpaVersion::V2, raw)
}

fn from_v2beta1(raw: &RawHpa) -> Result<Observation, NormalizationError> {
    extract::<RequiredStatus>(HpaVersion::V2beta1, raw)
}

fn from_v2beta2(raw: &RawHpa) -> Result<Observation, NormalizationError> {
    extract::<RequiredStatus>(HpaVersion::V2beta2, raw)
}

fn extract<S>(version: HpaVersion, raw: &RawHpa) -> Result<Observation, NormalizationError>
where
    S: DeserializeOwned + StatusFields,
{
    let key = raw.key()?;
    let hpa = HpaShape::<S>::deserialize(raw.as_value()).map_err(|source| {
        NormalizationError::Shape {
            version: version.as_str(),
            source,
        }
    })?;

    // A freshly created HPA has no status until the controller reconciles it
    let (current_replicas, last_scale_time) = match &hpa.status {
        Some(status) => (status.current_replicas(), status.last_scale_time()),
        None => (0, None),
    };

    let observation = Observation::new(key, current_replicas, hpa.spec.max_replicas);
    Ok(match last_scale_time {
        Some(time) => observation.with_last_scale_time(time),
        None => observation,
    })
}
