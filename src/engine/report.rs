//! Typed view of the engine's JSON run report
//!
//! Only the parts the relay acts on are typed; everything else is kept as
//! raw JSON so re-serializing loses nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Complete run report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub plays: Vec<PlayReport>,
    #[serde(default)]
    pub stats: BTreeMap<String, HostStats>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One play and its tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayReport {
    #[serde(default)]
    pub play: Value,
    #[serde(default)]
    pub tasks: Vec<TaskReport>,
}

/// One task with per-host results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    #[serde(default)]
    pub task: Value,
    #[serde(default)]
    pub hosts: BTreeMap<String, Value>,
}

/// Per-host counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStats {
    #[serde(default)]
    pub ok: u64,
    #[serde(default)]
    pub changed: u64,
    #[serde(default)]
    pub unreachable: u64,
    #[serde(default)]
    pub failures: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub rescued: u64,
    #[serde(default)]
    pub ignored: u64,
}

impl RunReport {
    /// Parse engine stdout; `None` when it is not a JSON report
    pub fn parse(stdout: &str) -> Option<Self> {
        let start = stdout.find('{')?;
        serde_json::from_str(stdout.get(start..)?.trim_end()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
{
    "custom_stats": {},
    "plays": [
        {
            "play": {"id": "1", "name": "web"},
            "tasks": [
                {
                    "task": {"id": "2", "name": "Gathering Facts"},
                    "hosts": {"web1": {"action": "gather_facts", "ansible_facts": {"os": "linux"}}}
                },
                {
                    "task": {"id": "3", "name": "uptime"},
                    "hosts": {"web1": {"action": "command", "rc": 0, "stdout": "up 3 days"}}
                }
            ]
        }
    ],
    "stats": {
        "web1": {"ok": 2, "changed": 1, "unreachable": 0, "failures": 0, "skipped": 0},
        "web2": {"ok": 0, "unreachable": 1}
    }
}
"#;

    #[test]
    fn test_parse_report() {
        let report = RunReport::parse(SAMPLE).unwrap();
        assert_eq!(report.plays.len(), 1);
        assert_eq!(report.plays[0].tasks.len(), 2);
        assert_eq!(report.plays[0].tasks[1].hosts["web1"]["stdout"], "up 3 days");
        assert_eq!(report.stats["web1"].changed, 1);
        assert_eq!(report.stats["web2"].unreachable, 1);
        assert!(report.extra.contains_key("custom_stats"));
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let stdout = format!("[WARNING]: provided hosts list is empty\n{SAMPLE}");
        assert!(RunReport::parse(&stdout).is_some());
    }

    #[test]
    fn test_non_json_output_is_not_a_report() {
        assert!(RunReport::parse("web1 | SUCCESS | rc=0 >>\nup 3 days\n").is_none());
        assert!(RunReport::parse("").is_none());
    }
}
