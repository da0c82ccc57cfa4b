//! JSON Registry Repository
//!
//! Persists the global registry, by default at `~/.devstack/projects.json`.
//! The location is resolved once into `Config::registry_path`.

use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::entities::Registry;
use crate::domain::ports::{RegistryError, RegistryRepository};
use crate::infrastructure::fs::{atomic_write, devstack_user_dir};

/// Overrides the registry location (tests, CI)
pub const REGISTRY_PATH_VAR: &str = "DEVSTACK_REGISTRY_PATH";

pub const REGISTRY_FILE: &str = "projects.json";

pub struct JsonRegistryRepository {
    path: PathBuf,
}

impl JsonRegistryRepository {
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self) -> Result<fs::File, RegistryError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(access)?;
        }

        let lock_file = fs::File::create(&lock_path).map_err(access)?;
        lock_file.lock_exclusive().map_err(access)?;
        Ok(lock_file)
    }

    fn load_from_disk(&self) -> Result<Registry, RegistryError> {
        if !self.path.exists() {
            return Ok(Registry::new());
        }

        let content = fs::read_to_string(&self.path).map_err(access)?;
        if content.trim().is_empty() {
            return Ok(Registry::new());
        }

        serde_json::from_str(&content).map_err(|e| RegistryError::Corrupted {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn save_to_disk(&self, registry: &Registry) -> Result<(), RegistryError> {
        let mut content = serde_json::to_string_pretty(registry).map_err(|e| {
            RegistryError::SerializationError {
                message: e.to_string(),
            }
        })?;
        content.push('\n');

        atomic_write(&self.path, content.as_bytes()).map_err(|e| RegistryError::AccessError {
            message: e.to_string(),
        })
    }
}

impl RegistryRepository for JsonRegistryRepository {
    fn load(&self) -> Result<Registry, RegistryError> {
        self.load_from_disk()
    }

    fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        let lock_file = self.lock()?;
        let result = self.save_to_disk(registry);
        let _ = lock_file.unlock();
        result
    }

    fn update(&self, change: &mut dyn FnMut(&mut Registry)) -> Result<Registry, RegistryError> {
        let lock_file = self.lock()?;

        let result = self.load_from_disk().and_then(|mut registry| {
            change(&mut registry);
            self.save_to_disk(&registry)?;
            Ok(registry)
        });

        let _ = lock_file.unlock();
        result
    }
}

fn access(e: std::io::Error) -> RegistryError {
    RegistryError::AccessError {
        message: e.to_string(),
    }
}

/// `<home>/.devstack/projects.json`
pub fn default_registry_path() -> PathBuf {
    devstack_user_dir().join(REGISTRY_FILE)
}
