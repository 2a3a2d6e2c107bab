//! Configuration system
//!
//! Handles YAML/TOML config file parsing and validation of the threshold
//! policy and reporter definitions.

pub mod file;

pub use file::ConfigFile;

use crate::domain::{ThresholdPolicy, WorkloadKey};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Delivery destinations grouped by kind
    pub reporters: ReporterConfig,
    /// Monitored workloads
    pub hpa: Vec<HpaConfig>,
}

/// Reporter definitions
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ReporterConfig {
    /// Slack incoming webhooks
    pub slack: Vec<ReporterEntry>,
    /// Console writers
    pub stdout: Vec<ReporterEntry>,
}

impl ReporterConfig {
    /// Total number of configured reporters
    pub fn len(&self) -> usize {
        self.slack.len() + self.stdout.len()
    }

    /// Whether no reporter is configured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One configured reporter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReporterEntry {
    /// Name shown in rendered alerts and logs
    pub name: String,
    /// Kind-specific settings
    #[serde(default, deserialize_with = "scalar_map")]
    pub configs: BTreeMap<String, String>,
}

/// Settings are plain strings, but YAML and TOML users write `10` or `true`
/// without quotes
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

impl ReporterEntry {
    /// Create an entry without settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configs: BTreeMap::new(),
        }
    }

    /// Add a setting
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configs.insert(key.into(), value.into());
        self
    }

    /// Look up a setting
    pub fn config(&self, key: &str) -> Option<&str> {
        self.configs.get(key).map(String::as_str)
    }
}

/// One monitored HorizontalPodAutoscaler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HpaConfig {
    /// HPA name
    pub name: String,
    /// HPA namespace
    pub namespace: String,
    /// Replica count at which a warning is raised
    pub threshold: i32,
}

impl HpaConfig {
    /// Key identifying the workload
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::new(&self.namespace, &self.name)
    }
}

impl AppConfig {
    /// Validate the `hpa` entries and build the threshold policy
    pub fn threshold_policy(&self) -> Result<ThresholdPolicy, ConfigError> {
        let mut seen = HashSet::new();

        for (i, hpa) in self.hpa.iter().enumerate() {
            if hpa.name.is_empty() {
                return Err(ConfigError::MissingField(format!("hpa[{}].name", i)));
            }
            if hpa.namespace.is_empty() {
                return Err(ConfigError::MissingField(format!("hpa[{}].namespace", i)));
            }
            if hpa.threshold < 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("hpa[{}].threshold", i),
                    message: format!("threshold must not be negative, got {}", hpa.threshold),
                });
            }
            if !seen.insert(hpa.key()) {
                log::warn!(
                    "[config] {} listed more than once, using the last threshold",
                    hpa.key()
                );
            }
        }

        Ok(ThresholdPolicy::new(
            self.hpa.iter().map(|hpa| (hpa.key(), hpa.threshold)),
        ))
    }

    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
reporters:
  slack:
    - name: ops
      configs:
        webhook_url: https://hooks.slack.com/services/T000/B000/XXXX
        channel: "#alerts"
  stdout:
    - name: console
hpa:
  - name: api
    namespace: default
    threshold: 5
  - name: worker
    namespace: jobs
    threshold: 8
"##;

    #[test]
    fn test_parse_yaml() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.reporters.len(), 2);
        assert_eq!(config.reporters.slack[0].name, "ops");
        assert_eq!(config.reporters.slack[0].config("channel"), Some("#alerts"));
        assert!(config.reporters.stdout[0].configs.is_empty());
        assert_eq!(config.hpa.len(), 2);
        assert_eq!(config.hpa[1].key(), WorkloadKey::new("jobs", "worker"));
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
[[reporters.stdout]]
name = "console"
configs = { target = "stderr" }

[[hpa]]
name = "api"
namespace = "default"
threshold = 5
"#;
        let config = AppConfig::from_toml(content).unwrap();
        assert_eq!(config.reporters.stdout[0].config("target"), Some("stderr"));
        assert!(config.reporters.slack.is_empty());
        assert_eq!(config.hpa[0].threshold, 5);
    }

    #[test]
    fn test_unquoted_settings_become_strings() {
        let config = AppConfig::from_yaml(
            "reporters:\n  stdout:\n    - name: console\n      configs:\n        color: false\n  slack:\n    - name: ops\n      configs:\n        timeout_secs: 30\n",
        )
        .unwrap();
        assert_eq!(config.reporters.stdout[0].config("color"), Some("false"));
        assert_eq!(config.reporters.slack[0].config("timeout_secs"), Some("30"));

        let config = AppConfig::from_toml(
            "[[reporters.slack]]\nname = \"ops\"\nconfigs = { timeout_secs = 5 }\n",
        )
        .unwrap();
        assert_eq!(config.reporters.slack[0].config("timeout_secs"), Some("5"));
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.reporters.is_empty());
    }

    #[test]
    fn test_threshold_policy() {
        let policy = AppConfig::from_yaml(SAMPLE).unwrap().threshold_policy().unwrap();
        assert_eq!(policy.len(), 2);
        assert_eq!(policy.threshold(&WorkloadKey::new("default", "api")), Some(5));
        assert_eq!(policy.threshold(&WorkloadKey::new("jobs", "worker")), Some(8));
        assert_eq!(policy.threshold(&WorkloadKey::new("default", "worker")), None);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = AppConfig {
            hpa: vec![HpaConfig {
                name: "api".to_string(),
                namespace: "default".to_string(),
                threshold: -1,
            }],
            ..AppConfig::default()
        };
        assert!(matches!(
            config.threshold_policy(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let config = AppConfig {
            hpa: vec![HpaConfig {
                name: "api".to_string(),
                namespace: String::new(),
                threshold: 1,
            }],
            ..AppConfig::default()
        };
        assert!(matches!(
            config.threshold_policy(),
            Err(ConfigError::MissingField(field)) if field == "hpa[0].namespace"
        ));
    }

    #[test]
    fn test_duplicate_entry_keeps_last() {
        let config = AppConfig::from_yaml(
            "hpa:\n  - {name: api, namespace: default, threshold: 3}\n  - {name: api, namespace: default, threshold: 7}\n",
        )
        .unwrap();
        let policy = config.threshold_policy().unwrap();
        assert_eq!(policy.len(), 1);
        assert_eq!(policy.threshold(&WorkloadKey::new("default", "api")), Some(7));
    }

    #[test]
    fn test_missing_threshold_is_parse_error() {
        let result = AppConfig::from_yaml("hpa:\n  - {name: api, namespace: default}\n");
        assert!(matches!(result, Err(ConfigError::YamlError(_))));
    }
}
