//! Unified error types for hpa-reporter
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration loading/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from version discovery or the watch subscription
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// IO error (file operations, stdout)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from resolving, subscribing to and running the HPA watch
#[derive(Error, Debug)]
pub enum WatchError {
    /// Cluster credentials could not be loaded or the client could not be built
    #[error("Failed to create Kubernetes client: {0}")]
    ClientFailure(String),

    /// The API discovery request itself failed
    #[error("Failed to query API discovery: {0}")]
    DiscoveryFailure(String),

    /// Discovery succeeded but no known HPA version is served
    #[error("Unsupported HPA version: {group}/{resource} is served as [{}]", .served.join(", "))]
    UnsupportedVersion {
        group: String,
        resource: String,
        served: Vec<String>,
    },

    /// Registering or removing an event handler failed
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Transient failure reported by the watch stream
    #[error("Watch stream error: {0}")]
    Stream(String),
}

/// Errors from turning a raw HPA payload into an observation
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// metadata.name or metadata.namespace missing
    #[error("HPA object is missing metadata.{0}")]
    MissingMetadata(&'static str),

    /// Payload does not match the shape of the resolved version
    #[error("HPA object does not match autoscaling/{version}: {source}")]
    Shape {
        version: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from shipping a rendered alert to a destination
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Writing to a local stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request could not be completed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Destination answered with a non-success status
    #[error("Destination rejected alert with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
