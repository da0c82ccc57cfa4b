//! Orchestrator options

use std::time::Duration;

pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(300);

/// How the container engine is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Program and leading arguments, e.g. `["docker", "compose"]`
    pub command: Vec<String>,
    /// Applied to every call except `logs --follow`
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec!["docker".to_string(), "compose".to_string()],
            timeout: Some(DEFAULT_ENGINE_TIMEOUT),
        }
    }
}

impl EngineConfig {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub service: Option<String>,
    /// Stream until the process is interrupted
    pub follow: bool,
    pub tail: Option<usize>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: Option<String>) -> Self {
        self.service = service;
        self
    }

    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    pub fn with_tail(mut self, tail: Option<usize>) -> Self {
        self.tail = tail;
        self
    }

    /// Arguments after `logs`.
    pub(super) fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.follow {
            args.push("--follow".to_string());
        }
        if let Some(tail) = self.tail {
            args.push("--tail".to_string());
            args.push(tail.to_string());
        }
        if let Some(service) = &self.service {
            args.push(service.clone());
        }
        args
    }
}
