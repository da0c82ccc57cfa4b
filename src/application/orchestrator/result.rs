//! Orchestrator results

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a lifecycle call ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOutcome {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
    Restarted,
}

impl LifecycleOutcome {
    /// Whether the engine was invoked and the state changed.
    pub fn changed(&self) -> bool {
        !matches!(
            self,
            LifecycleOutcome::AlreadyRunning | LifecycleOutcome::AlreadyStopped
        )
    }
}

impl fmt::Display for LifecycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleOutcome::Started => "started",
            LifecycleOutcome::AlreadyRunning => "already running",
            LifecycleOutcome::Stopped => "stopped",
            LifecycleOutcome::AlreadyStopped => "already stopped",
            LifecycleOutcome::Restarted => "restarted",
        })
    }
}

/// One container as reported by `ps --format json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(rename(deserialize = "Service"), default)]
    pub service: String,
    /// Container name
    #[serde(rename(deserialize = "Name"), default)]
    pub name: String,
    #[serde(rename(deserialize = "State"), default)]
    pub state: String,
    /// Human readable, e.g. `Up 3 minutes (healthy)`
    #[serde(rename(deserialize = "Status"), default)]
    pub status: String,
    #[serde(rename(deserialize = "Health"), default)]
    pub health: String,
    #[serde(rename(deserialize = "ExitCode"), default)]
    pub exit_code: i32,
    #[serde(rename(deserialize = "Publishers"), default, deserialize_with = "nullable")]
    pub publishers: Vec<Publisher>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(rename(deserialize = "URL"), default)]
    pub url: String,
    #[serde(rename(deserialize = "TargetPort"), default)]
    pub target_port: u16,
    #[serde(rename(deserialize = "PublishedPort"), default)]
    pub published_port: u16,
    #[serde(rename(deserialize = "Protocol"), default)]
    pub protocol: String,
}

impl ServiceStatus {
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }

    /// Host ports actually published, e.g. `8080->80/tcp`.
    pub fn published_ports(&self) -> Vec<String> {
        let mut ports: Vec<String> = self
            .publishers
            .iter()
            .filter(|p| p.published_port != 0)
            .map(|p| format!("{}->{}/{}", p.published_port, p.target_port, p.protocol))
            .collect();
        ports.dedup();
        ports
    }
}

fn nullable<'de, D>(deserializer: D) -> Result<Vec<Publisher>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Publisher>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse engine status output: one JSON object per line, or a single JSON
/// array. Lines that do not parse are skipped.
pub fn parse_status(output: &str) -> Vec<ServiceStatus> {
    let trimmed = output.trim();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<ServiceStatus>>(trimmed) {
            Ok(all) => return all,
            Err(e) => debug!(error = %e, "status output is not a JSON array; trying lines"),
        }
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<ServiceStatus>(line) {
            Ok(status) => Some(status),
            Err(e) => {
                debug!(line, error = %e, "skipping unparseable status line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEB: &str = r#"{"Name":"shop-app-1","Service":"app","State":"running","Status":"Up 2 minutes","Health":"","ExitCode":0,"Publishers":[{"URL":"0.0.0.0","TargetPort":80,"PublishedPort":8080,"Protocol":"tcp"},{"URL":"::","TargetPort":80,"PublishedPort":8080,"Protocol":"tcp"}]}"#;
    const DB: &str = r#"{"Name":"shop-postgres-1","Service":"postgres","State":"exited","Status":"Exited (1)","ExitCode":1,"Publishers":null}"#;

    #[test]
    fn empty_output_is_no_services() {
        assert!(parse_status("").is_empty());
        assert!(parse_status("\n\n").is_empty());
        assert!(parse_status("[]").is_empty());
    }

    #[test]
    fn parses_newline_delimited_records() {
        let statuses = parse_status(&format!("{}\n{}\n", WEB, DB));

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].service, "app");
        assert!(statuses[0].is_running());
        assert_eq!(statuses[0].published_ports(), vec!["8080->80/tcp"]);
        assert_eq!(statuses[1].exit_code, 1);
        assert!(statuses[1].publishers.is_empty());
    }

    #[test]
    fn skips_malformed_lines() {
        let statuses = parse_status(&format!("{}\nnot json\n\n{{\"Service\":\n{}", WEB, DB));
        let services: Vec<_> = statuses.iter().map(|s| s.service.as_str()).collect();
        assert_eq!(services, vec!["app", "postgres"]);
    }

    #[test]
    fn parses_json_array() {
        let statuses = parse_status(&format!("[{},{}]", WEB, DB));
        assert_eq!(statuses.len(), 2);
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let statuses = parse_status(DB);
        let json = serde_json::to_value(&statuses[0]).unwrap();
        assert_eq!(json["service"], "postgres");
        assert_eq!(json["exit_code"], 1);
    }

    #[test]
    fn outcome_change_flag() {
        assert!(LifecycleOutcome::Started.changed());
        assert!(!LifecycleOutcome::AlreadyRunning.changed());
        assert_eq!(LifecycleOutcome::AlreadyStopped.to_string(), "already stopped");
    }
}
