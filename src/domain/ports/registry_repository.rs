//! RegistryRepository port
//!
//! Persists the global discovery index at `~/.devstack/projects.json`.

use crate::domain::entities::{ProjectSummary, Registry};
use std::path::PathBuf;

pub trait RegistryRepository {
    fn load(&self) -> Result<Registry, RegistryError>;
    fn save(&self, registry: &Registry) -> Result<(), RegistryError>;

    /// Load, apply `change`, save. Implementations hold their lock throughout.
    fn update(&self, change: &mut dyn FnMut(&mut Registry)) -> Result<Registry, RegistryError>;

    /// Merge `partial` into the entry for `name` and stamp its access time.
    fn register(&self, name: &str, partial: ProjectSummary) -> Result<(), RegistryError> {
        let mut partial = Some(partial);
        self.update(&mut |registry: &mut Registry| {
            if let Some(partial) = partial.take() {
                registry.register(name, partial);
            }
        })
        .map(|_| ())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Failed to access registry: {message}")]
    AccessError { message: String },

    #[error("Failed to serialize registry: {message}")]
    SerializationError { message: String },

    #[error(
        "registry file corrupted: {path}\n  → Fix: Delete it; projects re-register on their next command\n  → Run: rm {path}\n  → Details: {message}"
    )]
    Corrupted { path: PathBuf, message: String },
}
