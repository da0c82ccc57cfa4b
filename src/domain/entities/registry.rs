//! Registry entity
//!
//! Discovery index of every project devstack has initialized or touched, used
//! by `devstack projects` and port allocation. It is never authoritative for a
//! project's own state; that lives in the project's `.devstack/project.json`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::project::{ProjectRecord, ProjectState};

/// Denormalized copy of a project's record. Every field is optional so callers
/// can register partial data without clobbering what is already known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ProjectState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<BTreeMap<String, u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Fields written by other tools or newer versions, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProjectSummary {
    pub fn from_record(record: &ProjectRecord) -> Self {
        Self {
            path: Some(record.path.clone()),
            stack: Some(record.stack.clone()),
            services: Some(record.services.clone()),
            state: Some(record.state),
            ports: if record.ports.is_empty() {
                None
            } else {
                Some(record.ports.clone())
            },
            created_at: Some(record.created_at),
            last_accessed_at: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Only the lifecycle state, for mirroring transitions.
    pub fn state_only(state: ProjectState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Overlay the fields present in `other`, keeping the rest.
    pub fn merge(&mut self, other: ProjectSummary) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.path, other.path);
        take(&mut self.stack, other.stack);
        take(&mut self.services, other.services);
        take(&mut self.state, other.state);
        take(&mut self.ports, other.ports);
        take(&mut self.created_at, other.created_at);
        take(&mut self.last_accessed_at, other.last_accessed_at);
        self.extra.extend(other.extra);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectSummary>,
}

fn default_version() -> u32 {
    1
}

impl Registry {
    pub fn new() -> Self {
        Self {
            version: 1,
            projects: BTreeMap::new(),
        }
    }

    /// Merge `partial` into the entry for `name` and stamp its access time.
    pub fn register(&mut self, name: &str, partial: ProjectSummary) {
        self.register_at(name, partial, Utc::now());
    }

    pub fn register_at(&mut self, name: &str, partial: ProjectSummary, now: DateTime<Utc>) {
        let entry = self.projects.entry(name.to_string()).or_default();
        entry.merge(partial);
        entry.last_accessed_at = Some(now);
    }

    pub fn get(&self, name: &str) -> Option<&ProjectSummary> {
        self.projects.get(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.projects.remove(name).is_some()
    }

    /// Drop entries for which `is_alive` is false, returning their names.
    pub fn prune(&mut self, is_alive: impl Fn(&ProjectSummary) -> bool) -> Vec<String> {
        let dead: Vec<String> = self
            .projects
            .iter()
            .filter(|(_, summary)| !is_alive(summary))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &dead {
            self.projects.remove(name);
        }
        dead
    }

    /// Host ports claimed by projects other than `except`.
    pub fn ports_in_use(&self, except: Option<&str>) -> BTreeSet<u16> {
        self.projects
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != except)
            .filter_map(|(_, summary)| summary.ports.as_ref())
            .flat_map(|ports| ports.values().copied())
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = (&str, &ProjectSummary)> {
        self.projects.iter().map(|(name, s)| (name.as_str(), s))
    }
}
