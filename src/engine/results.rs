//! Per-host view of a finished run
//!
//! Task results from a [`RunReport`] are grouped by host into a `contacted`
//! set and a `dark` set for hosts that could not be reached. Each result
//! carries a coarse [`Status`] alongside the raw module output.

use super::report::{RunReport, TaskReport};
use crate::error::{RelayError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, instrument};

/// Module actions that only gather facts
const FACT_ACTIONS: &[&str] = &["setup", "gather_facts"];

/// Module actions whose command line is the interesting part
const COMMAND_ACTIONS: &[&str] = &["command", "shell", "raw", "script"];

/// Coarse outcome of one task on one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
    /// The module ran but returned a non-zero `rc`
    Error,
    Skipped,
    /// Fact gathering returned facts
    Facts,
    /// Nothing conclusive yet
    Pending,
}

impl Status {
    fn of(module: &str, data: &Value) -> Self {
        let truthy = |key: &str| data.get(key).and_then(Value::as_bool).unwrap_or(false);

        if truthy("failed") || truthy("unreachable") {
            return Self::Failed;
        }
        if truthy("skipped") {
            return Self::Skipped;
        }
        if let Some(rc) = data.get("rc").and_then(Value::as_i64) {
            return if rc == 0 { Self::Ok } else { Self::Error };
        }

        match module {
            "ping" if data.get("ping").is_some() => Self::Ok,
            "ping" => Self::Pending,
            _ if FACT_ACTIONS.contains(&module) => {
                let has_facts = data
                    .get("ansible_facts")
                    .and_then(Value::as_object)
                    .is_some_and(|facts| !facts.is_empty());
                if has_facts { Self::Facts } else { Self::Pending }
            }
            _ => Self::Ok,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Ok => "SUCCESS",
            Self::Failed | Self::Error => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Facts => "FACTS",
            Self::Pending => "PENDING",
        }
    }
}

/// One task's outcome on one host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub host: String,
    pub task: String,
    /// Module name without its collection prefix
    pub module: String,
    pub status: Status,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i64>,
    /// Command line for command-like modules, otherwise the module name
    pub command: String,
    /// Raw module output
    pub result: Value,
}

impl TaskResult {
    fn new(host: &str, task: &TaskReport, data: &Value) -> Self {
        let action = data.get("action").and_then(Value::as_str).unwrap_or_default();
        let module = action.rsplit('.').next().unwrap_or(action).to_string();

        Self {
            host: host.to_string(),
            task: task
                .task
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            status: Status::of(&module, data),
            changed: data.get("changed").and_then(Value::as_bool).unwrap_or(false),
            rc: data.get("rc").and_then(Value::as_i64),
            command: command_line(&module, data),
            module,
            result: data.clone(),
        }
    }

    /// Whether this result came from fact gathering
    pub fn is_facts(&self) -> bool {
        FACT_ACTIONS.contains(&self.module.as_str())
    }

    /// `msg` the module returned, if any
    pub fn message(&self) -> Option<&str> {
        self.result.get("msg").and_then(Value::as_str)
    }

    /// One-line rendering, e.g. `web1 | SUCCESS | rc=0 | uptime`
    pub fn summary_line(&self) -> String {
        let mut line = format!("{} | {}", self.host, self.status.label());
        if self.changed {
            line.push_str(" | changed");
        }
        if let Some(rc) = self.rc {
            line.push_str(&format!(" | rc={rc}"));
        }
        line.push_str(" | ");
        line.push_str(&self.command);
        if let (Status::Failed | Status::Error, Some(msg)) = (self.status, self.message()) {
            line.push_str(&format!(" | {msg}"));
        }
        line
    }
}

fn command_line(module: &str, data: &Value) -> String {
    if !COMMAND_ACTIONS.contains(&module) {
        return module.to_string();
    }
    match data.get("cmd") {
        Some(Value::String(cmd)) => cmd.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => data
            .pointer("/invocation/module_args/_raw_params")
            .and_then(Value::as_str)
            .unwrap_or(module)
            .to_string(),
    }
}

/// Results of one host, in task order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostResults {
    pub host: String,
    pub results: Vec<TaskResult>,
}

/// How a summary is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Pretty JSON document with `contacted` and `dark` lists
    Json,
    /// One [`TaskResult::summary_line`] per result, contacted hosts first
    Lines,
}

/// Contacted and unreachable hosts, each sorted by host name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSummary {
    pub contacted: Vec<HostResults>,
    pub dark: Vec<HostResults>,
}

impl ResultSummary {
    /// Group a run report by host
    ///
    /// Fact gathering results are dropped unless `show_facts` is set; their
    /// host still appears.
    pub fn from_report(report: &RunReport, show_facts: bool) -> Self {
        let mut contacted: BTreeMap<String, Vec<TaskResult>> = BTreeMap::new();
        let mut dark: BTreeMap<String, Vec<TaskResult>> = BTreeMap::new();

        for task in report.plays.iter().flat_map(|play| &play.tasks) {
            for (host, data) in &task.hosts {
                let unreachable = data.get("unreachable").and_then(Value::as_bool).unwrap_or(false);
                let set = if unreachable { &mut dark } else { &mut contacted };
                let results = set.entry(host.clone()).or_default();

                let result = TaskResult::new(host, task, data);
                if show_facts || !result.is_facts() {
                    results.push(result);
                }
            }
        }

        // Hosts that dropped out before any task reported them
        for (host, stats) in &report.stats {
            if stats.unreachable > 0 && !contacted.contains_key(host) {
                dark.entry(host.clone()).or_default();
            }
        }

        let collect = |set: BTreeMap<String, Vec<TaskResult>>| -> Vec<HostResults> {
            set.into_iter()
                .map(|(host, results)| HostResults { host, results })
                .collect()
        };
        Self {
            contacted: collect(contacted),
            dark: collect(dark),
        }
    }

    /// Every result, contacted hosts first
    pub fn results(&self) -> impl Iterator<Item = &TaskResult> {
        self.contacted
            .iter()
            .chain(&self.dark)
            .flat_map(|host| &host.results)
    }

    /// Write the summary in `format`
    pub fn write_to<W: Write>(&self, writer: &mut W, format: ReportFormat) -> io::Result<()> {
        match format {
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, self)?;
                writeln!(writer)
            }
            ReportFormat::Lines => {
                for result in self.results() {
                    writeln!(writer, "{}", result.summary_line())?;
                }
                Ok(())
            }
        }
    }

    /// Rendered summary without a trailing newline
    pub fn render(&self, format: ReportFormat) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = self.write_to(&mut buffer, format) {
            debug!("Failed to render result summary: {}", e);
        }
        String::from_utf8_lossy(&buffer).trim_end().to_string()
    }

    /// Write the summary to a file, replacing it
    #[instrument(skip(self))]
    pub fn write_to_file(&self, path: &Path, format: ReportFormat) -> Result<()> {
        let file = File::create(path).map_err(|e| RelayError::report(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, format)
            .and_then(|()| writer.flush())
            .map_err(|e| RelayError::report(path, e))?;
        debug!("Wrote result summary to {}", path.display());
        Ok(())
    }
}

/// Turn raw engine stdout into the text shown to the user
///
/// JSON reports become a pretty [`ResultSummary`]; anything else is passed
/// through.
pub fn render_output(stdout: &str, show_facts: bool) -> String {
    match RunReport::parse(stdout) {
        Some(report) => ResultSummary::from_report(&report, show_facts).render(ReportFormat::Json),
        None => stdout.trim_end().to_string(),
    }
}
