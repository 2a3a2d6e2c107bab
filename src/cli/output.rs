//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::config::AppConfig;
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", render_output(data, format))
}

/// Render output in the selected format
pub fn render_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => data.to_table(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Compact => data.to_compact(),
    }
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Monitored workload for display
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadEntry {
    pub namespace: String,
    pub name: String,
    pub threshold: i32,
}

/// Configured reporter for display
///
/// Reporter settings are left out since they may carry webhook secrets.
#[derive(Debug, Clone, Serialize)]
pub struct ReporterSummary {
    pub kind: String,
    pub name: String,
}

/// Validated configuration for display
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub source: String,
    pub workloads: Vec<WorkloadEntry>,
    pub reporters: Vec<ReporterSummary>,
}

impl ConfigSummary {
    /// Summarize a configuration loaded from `source`
    pub fn new(source: impl Into<String>, config: &AppConfig) -> Self {
        let workloads = config
            .hpa
            .iter()
            .map(|hpa| WorkloadEntry {
                namespace: hpa.namespace.clone(),
                name: hpa.name.clone(),
                threshold: hpa.threshold,
            })
            .collect();

        let stdout = config.reporters.stdout.iter().map(|r| ("stdout", r));
        let slack = config.reporters.slack.iter().map(|r| ("slack", r));
        let reporters = stdout
            .chain(slack)
            .map(|(kind, entry)| ReporterSummary {
                kind: kind.to_string(),
                name: entry.name.clone(),
            })
            .collect();

        Self {
            source: source.into(),
            workloads,
            reporters,
        }
    }
}

impl TableDisplay for ConfigSummary {
    fn to_table(&self) -> String {
        let mut lines = vec![format!("Config: {}", self.source)];

        lines.push(format!("Workloads ({}):", self.workloads.len()));
        if self.workloads.is_empty() {
            lines.push("  (none)".to_string());
        }
        for w in &self.workloads {
            lines.push(format!(
                "  {}/{}  threshold {}",
                w.namespace, w.name, w.threshold
            ));
        }

        lines.push(format!("Reporters ({}):", self.reporters.len()));
        if self.reporters.is_empty() {
            lines.push("  (none)".to_string());
        }
        for r in &self.reporters {
            lines.push(format!("  {}({})", r.kind, r.name));
        }

        lines.join("\n")
    }

    fn to_compact(&self) -> String {
        format!(
            "{}: {} workloads, {} reporters",
            self.source,
            self.workloads.len(),
            self.reporters.len()
        )
    }
}
