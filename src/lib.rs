//! hpa-reporter - HorizontalPodAutoscaler threshold alerting library
//!
//! This library watches HorizontalPodAutoscalers, evaluates every update
//! against a per-workload threshold policy and fans the resulting alerts out
//! to independently running reporters.
//!
//! # Modules
//!
//! - [`alerts`]: Threshold evaluation, notifiers and delivery workers
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Workload identity, threshold policy and observations
//! - [`error`]: Error types
//! - [`services`]: Monitor wiring the pipeline together
//! - [`watch`]: Version discovery and the HPA watch stream

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod watch;

#[cfg(test)]
pub mod mock;

pub use error::{AppError, Result};
