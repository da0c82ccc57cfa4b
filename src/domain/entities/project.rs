//! Project record and lifecycle state
//!
//! The record is the persisted identity of one initialized project. Its source
//! of truth is `.devstack/project.json` inside the project itself.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ContentHash, Environment, ProjectName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    #[default]
    Uninitialized,
    Ready,
    Starting,
    Running,
    Stopping,
    Error,
}

/// Lifecycle command asking the project to change state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Stop,
}

impl LifecycleAction {
    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
        }
    }
}

/// What a lifecycle request should do from the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Enter the given transient state and run the engine
    Begin(ProjectState),
    /// Already in the state the action leads to
    NoOp,
    /// Another command is between its transient and final state
    Busy,
    /// The action makes no sense from here
    Illegal,
}

impl ProjectState {
    pub fn decide(self, action: LifecycleAction) -> TransitionDecision {
        use LifecycleAction::*;
        use ProjectState::*;

        match (self, action) {
            (Starting | Stopping, _) => TransitionDecision::Busy,
            (Uninitialized, _) => TransitionDecision::Illegal,
            (Ready | Error, Start) => TransitionDecision::Begin(Starting),
            (Running, Start) => TransitionDecision::NoOp,
            (Running | Error, Stop) => TransitionDecision::Begin(Stopping),
            (Ready, Stop) => TransitionDecision::NoOp,
        }
    }

    /// Final state once the engine call of a transient state has finished.
    pub fn settle(self, succeeded: bool) -> Option<ProjectState> {
        match (self, succeeded) {
            (ProjectState::Starting, true) => Some(ProjectState::Running),
            (ProjectState::Stopping, true) => Some(ProjectState::Ready),
            (ProjectState::Starting | ProjectState::Stopping, false) => Some(ProjectState::Error),
            _ => None,
        }
    }

    pub fn is_transient(self) -> bool {
        matches!(self, ProjectState::Starting | ProjectState::Stopping)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::Uninitialized => "UNINITIALIZED",
            ProjectState::Ready => "READY",
            ProjectState::Starting => "STARTING",
            ProjectState::Running => "RUNNING",
            ProjectState::Stopping => "STOPPING",
            ProjectState::Error => "ERROR",
        }
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: ProjectName,
    pub path: PathBuf,
    pub stack: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub environment: Environment,
    pub state: ProjectState,
    /// Port variable -> allocated host port
    #[serde(default)]
    pub ports: BTreeMap<String, u16>,
    /// Generated file name -> digest at generation time
    #[serde(default)]
    pub generated: BTreeMap<String, ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(name: ProjectName, path: PathBuf, stack: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name,
            path,
            stack: stack.into(),
            services: Vec::new(),
            environment: Environment::default(),
            state: ProjectState::Uninitialized,
            ports: BTreeMap::new(),
            generated: BTreeMap::new(),
            last_error: None,
            created_at: now,
            last_accessed_at: now,
        }
    }

    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_state(mut self, state: ProjectState) -> Self {
        self.state = state;
        self
    }

    /// Move to `state`, stamping the access time.
    pub fn transition_to(&mut self, state: ProjectState) {
        self.state = state;
        self.last_accessed_at = Utc::now();
        if state != ProjectState::Error {
            self.last_error = None;
        }
    }

    pub fn fail_with(&mut self, message: impl Into<String>) {
        self.transition_to(ProjectState::Error);
        self.last_error = Some(message.into());
    }
}
