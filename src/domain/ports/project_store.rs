//! ProjectStore port
//!
//! The authoritative copy of a project's record lives inside the project's
//! private directory. The store also hands out the advisory lock that guards
//! lifecycle transitions.

use std::path::{Path, PathBuf};

use crate::domain::entities::ProjectRecord;
use crate::domain::ports::FsError;

pub trait ProjectStore {
    /// Held for the duration of a lifecycle transition; released on drop.
    type Lock;

    /// `Ok(None)` when the project has no record yet.
    fn load(&self, project_root: &Path) -> Result<Option<ProjectRecord>, StoreError>;

    /// Atomically replace the record.
    fn save(&self, project_root: &Path, record: &ProjectRecord) -> Result<(), StoreError>;

    /// Take the lifecycle lock without waiting. `Ok(None)` when another
    /// invocation holds it.
    fn try_lock(&self, project_root: &Path) -> Result<Option<Self::Lock>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access project record {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    FileSystem(#[from] FsError),

    #[error("project record {path} is corrupted: {message}")]
    Corrupted { path: PathBuf, message: String },

    #[error("failed to serialize project record: {message}")]
    Serialization { message: String },
}
