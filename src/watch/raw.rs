//! Raw, version-specific HPA payloads

use crate::domain::WorkloadKey;
use crate::error::NormalizationError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use serde_json::Value;

/// An HPA object exactly as the API server returned it
#[derive(Debug, Clone, PartialEq)]
pub struct RawHpa(Value);

impl RawHpa {
    /// Wrap a JSON object
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Underlying JSON value
    #[inline]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Namespace and name from the object metadata
    pub fn key(&self) -> Result<WorkloadKey, NormalizationError> {
        let metadata = match self.0.get("metadata") {
            Some(metadata) => ObjectMeta::deserialize(metadata).ok(),
            None => None,
        }
        .unwrap_or_default();

        let name = metadata
            .name
            .filter(|n| !n.is_empty())
            .ok_or(NormalizationError::MissingMetadata("name"))?;
        let namespace = metadata
            .namespace
            .filter(|n| !n.is_empty())
            .ok_or(NormalizationError::MissingMetadata("namespace"))?;

        Ok(WorkloadKey::new(namespace, name))
    }
}

impl From<Value> for RawHpa {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
