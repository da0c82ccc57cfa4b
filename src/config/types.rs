//! Configuration type definitions

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::{EngineConfig, DEFAULT_PORT_RANGE};
use crate::domain::value_objects::Environment;
use crate::error::DevstackResult;
use crate::infrastructure::fs::devstack_user_dir;
use crate::infrastructure::repositories::default_registry_path;

use super::loader::{self, ConfigWarning};

/// Container engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_engine_command")]
    pub command: Vec<String>,

    /// Per-call limit in seconds; 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_engine_command() -> Vec<String> {
    EngineConfig::default().command
}

fn default_timeout_secs() -> u64 {
    300
}

/// Where the catalogs (`stacks.json`, `services.json`) live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Host port allocation range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortsConfig {
    #[serde(default = "default_range_start")]
    pub range_start: u16,

    #[serde(default = "default_range_end")]
    pub range_end: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            range_start: default_range_start(),
            range_end: default_range_end(),
        }
    }
}

fn default_range_start() -> u16 {
    *DEFAULT_PORT_RANGE.start()
}

fn default_range_end() -> u16 {
    *DEFAULT_PORT_RANGE.end()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub environment: Environment,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub ports: PortsConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// `tracing` filter directive, e.g. `info` or `devstack=debug`
    #[serde(default)]
    pub log_level: Option<String>,

    /// Global project index; filled in by `load_or_default` when unset
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> DevstackResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> DevstackResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load `explicit`, else the user config if present, else defaults;
    /// environment overrides applied on top.
    pub fn load_or_default(explicit: Option<&Path>) -> DevstackResult<(Self, Vec<ConfigWarning>)> {
        loader::load_or_default(explicit)
    }

    /// Apply environment variable overrides (DEVSTACK_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    pub fn engine_config(&self) -> EngineConfig {
        let timeout = match self.engine.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        EngineConfig::new(self.engine.command.clone()).with_timeout(timeout)
    }

    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.ports.range_start..=self.ports.range_end
    }

    /// Global project index location.
    pub fn registry_path(&self) -> PathBuf {
        self.registry_path
            .clone()
            .unwrap_or_else(default_registry_path)
    }

    /// Catalog directory: configured, else the user's, else the bundled one.
    pub fn templates_dir(&self) -> PathBuf {
        if let Some(dir) = &self.templates.dir {
            return dir.clone();
        }
        let user = devstack_user_dir().join("templates");
        if user.join(crate::infrastructure::catalog::STACKS_FILE).is_file() {
            return user;
        }
        Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
    }
}
