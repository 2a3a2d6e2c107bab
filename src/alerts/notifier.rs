//! Alert notification channels
//!
//! Provides the delivery destinations for alerts: a console writer and a
//! Slack incoming webhook.

use super::types::{Alert, AlertSeverity};
use crate::config::{ReporterConfig, ReporterEntry};
use crate::error::{ConfigError, DeliveryError};
use async_trait::async_trait;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

/// Default Slack request timeout in seconds
pub const DEFAULT_SLACK_TIMEOUT_SECS: u64 = 10;

/// Notification channel trait
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ship one alert
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError>;

    /// Configured reporter name
    fn name(&self) -> &str;

    /// Reporter kind, e.g. `stdout`
    fn kind(&self) -> &'static str;
}

/// Console notifier
///
/// Writes one line per alert to stdout (or stderr), optionally with colored
/// severity.
pub struct StdoutNotifier {
    name: String,
    /// Use stderr instead of stdout
    use_stderr: bool,
    /// Use colors (ANSI escape codes)
    use_colors: bool,
}

impl StdoutNotifier {
    /// Create a notifier writing to stdout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Build from a reporter entry
    ///
    /// Recognized settings: `target` (`stdout` or `stderr`) and `color`
    /// (`true`, `false` or `auto`).
    pub fn from_entry(entry: &ReporterEntry) -> Result<Self, ConfigError> {
        let mut notifier = Self::new(&entry.name);

        match entry.config("target") {
            None | Some("stdout") => {}
            Some("stderr") => notifier.use_stderr = true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: format!("reporters.stdout[{}].target", entry.name),
                    message: format!("expected 'stdout' or 'stderr', got '{}'", other),
                })
            }
        }

        match entry.config("color") {
            None | Some("auto") => {}
            Some(value) => {
                notifier.use_colors = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: format!("reporters.stdout[{}].color", entry.name),
                    message: format!("expected 'true', 'false' or 'auto', got '{}'", value),
                })?
            }
        }

        Ok(notifier)
    }

    /// Disable colors
    pub fn no_color(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    /// Render an alert as a single line
    pub fn render(&self, alert: &Alert) -> String {
        let mut line = format!(
            "stdout({}): {}[{}/{}]: replicas({}/{})",
            self.name,
            self.format_severity(alert.severity),
            alert.workload.name(),
            alert.workload.namespace(),
            alert.current_replicas,
            alert.max_replicas
        );
        if let Some(time) = alert.formatted_time() {
            line.push_str(&format!(" last_scale_time({})", time));
        }
        line
    }

    fn format_severity(&self, severity: AlertSeverity) -> String {
        if !self.use_colors {
            return severity.as_str().to_string();
        }

        let color_code = match severity {
            AlertSeverity::Warning => "\x1b[33m",  // Yellow
            AlertSeverity::Critical => "\x1b[31m", // Red
        };

        format!("{}{}\x1b[0m", color_code, severity.as_str())
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let message = self.render(alert);

        if self.use_stderr {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            writeln!(handle, "{}", message)?;
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", message)?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "stdout"
    }
}

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Slack incoming-webhook notifier
pub struct SlackNotifier {
    name: String,
    webhook_url: String,
    channel: Option<String>,
    username: Option<String>,
    client: reqwest::Client,
}

impl SlackNotifier {
    /// Build from a reporter entry
    ///
    /// `webhook_url` is required; `channel`, `username` and `timeout_secs`
    /// are optional.
    pub fn from_entry(entry: &ReporterEntry) -> Result<Self, ConfigError> {
        let key = |field: &str| format!("reporters.slack[{}].{}", entry.name, field);

        let webhook_url = entry
            .config("webhook_url")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingField(key("webhook_url")))?;
        if !webhook_url.starts_with("http://") && !webhook_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: key("webhook_url"),
                message: format!("not an http(s) URL: {}", webhook_url),
            });
        }

        let timeout_secs = match entry.config("timeout_secs") {
            Some(value) => value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: key("timeout_secs"),
                message: e.to_string(),
            })?,
            None => DEFAULT_SLACK_TIMEOUT_SECS,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: key("timeout_secs"),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            name: entry.name.clone(),
            webhook_url: webhook_url.to_string(),
            channel: entry.config("channel").map(str::to_string),
            username: entry.config("username").map(str::to_string),
            client,
        })
    }

    /// Render the message text
    pub fn render(&self, alert: &Alert) -> String {
        let mut text = format!("slack({}): {}", self.name, alert.summary());
        if let Some(time) = alert.formatted_time() {
            text.push_str(&format!(" last_scale_time({})", time));
        }
        text
    }

    fn payload(&self, alert: &Alert) -> SlackPayload<'_> {
        SlackPayload {
            text: self.render(alert),
            channel: self.channel.as_deref(),
            username: self.username.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "slack"
    }
}

/// Create every configured notifier, stdout reporters first
pub fn build_notifiers(config: &ReporterConfig) -> Result<Vec<Box<dyn Notifier>>, ConfigError> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::with_capacity(config.len());

    for entry in &config.stdout {
        notifiers.push(Box::new(StdoutNotifier::from_entry(entry)?));
    }
    for entry in &config.slack {
        notifiers.push(Box::new(SlackNotifier::from_entry(entry)?));
    }

    Ok(notifiers)
}
