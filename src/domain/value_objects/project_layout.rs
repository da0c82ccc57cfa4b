//! Where a project's generated files live
//!
//! Current layout keeps everything in `<root>/.devstack/`. Projects created
//! by older versions have the compose files and `.env` at the root; those
//! paths are only ever read. The lifecycle lock sits next to the private
//! directory, outside what `init --force` swaps.

use std::path::{Path, PathBuf};

use super::Environment;

/// Private directory under the project root
pub const PRIVATE_DIR: &str = ".devstack";
pub const BASE_FILE: &str = "docker-compose.yml";
pub const ENV_FILE: &str = ".env";
pub const RECORD_FILE: &str = "project.json";
pub const LOCK_FILE: &str = ".devstack.lock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn private_dir(&self) -> PathBuf {
        self.root.join(PRIVATE_DIR)
    }

    pub fn base_file(&self) -> PathBuf {
        self.private_dir().join(BASE_FILE)
    }

    pub fn overlay_file(&self, environment: Environment) -> PathBuf {
        self.private_dir().join(environment.overlay_file_name())
    }

    pub fn env_file(&self) -> PathBuf {
        self.private_dir().join(ENV_FILE)
    }

    pub fn record_file(&self) -> PathBuf {
        self.private_dir().join(RECORD_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn legacy_base_file(&self) -> PathBuf {
        self.root.join(BASE_FILE)
    }

    pub fn legacy_overlay_file(&self, environment: Environment) -> PathBuf {
        self.root.join(environment.overlay_file_name())
    }

    pub fn legacy_env_file(&self) -> PathBuf {
        self.root.join(ENV_FILE)
    }
}
