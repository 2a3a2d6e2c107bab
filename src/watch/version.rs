//! Known HorizontalPodAutoscaler schema versions

use crate::error::WatchError;
use std::fmt;
use std::str::FromStr;

/// API group serving HorizontalPodAutoscalers
pub const HPA_GROUP: &str = "autoscaling";

/// Plural resource name used by discovery
pub const HPA_RESOURCE: &str = "horizontalpodautoscalers";

/// Kind of the watched resource
pub const HPA_KIND: &str = "HorizontalPodAutoscaler";

/// Schema revision of the autoscaling API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HpaVersion {
    V1,
    V2,
    V2beta1,
    V2beta2,
}

impl HpaVersion {
    /// Every version this build knows how to normalize
    pub const ALL: [HpaVersion; 4] = [Self::V1, Self::V2, Self::V2beta1, Self::V2beta2];

    /// Version string as used in `apiVersion`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V2beta1 => "v2beta1",
            Self::V2beta2 => "v2beta2",
        }
    }

    /// Pick the first known version from a list in server-preference order
    pub fn pick(served: &[String]) -> Result<Self, WatchError> {
        served
            .iter()
            .find_map(|v| v.parse().ok())
            .ok_or_else(|| WatchError::UnsupportedVersion {
                group: HPA_GROUP.to_string(),
                resource: HPA_RESOURCE.to_string(),
                served: served.to_vec(),
            })
    }
}

impl FromStr for HpaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown autoscaling version: {}", s))
    }
}

impl fmt::Display for HpaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn served(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_known_versions() {
        for version in HpaVersion::ALL {
            assert_eq!(version.as_str().parse::<HpaVersion>().unwrap(), version);
        }
        assert!("v3".parse::<HpaVersion>().is_err());
        assert!("V1".parse::<HpaVersion>().is_err());
    }

    #[test]
    fn test_pick_respects_preference_order() {
        assert_eq!(HpaVersion::pick(&served(&["v2", "v1"])).unwrap(), HpaVersion::V2);
        assert_eq!(HpaVersion::pick(&served(&["v1", "v2"])).unwrap(), HpaVersion::V1);
    }

    #[test]
    fn test_pick_skips_unknown() {
        assert_eq!(
            HpaVersion::pick(&served(&["v3alpha1", "v2beta2"])).unwrap(),
            HpaVersion::V2beta2
        );
    }

    #[test]
    fn test_pick_none_known() {
        let err = HpaVersion::pick(&served(&["v3"])).unwrap_err();
        match err {
            WatchError::UnsupportedVersion { served, .. } => assert_eq!(served, vec!["v3"]),
            other => panic!("unexpected error: {}", other),
        }

        assert!(matches!(
            HpaVersion::pick(&[]),
            Err(WatchError::UnsupportedVersion { .. })
        ));
    }
}
