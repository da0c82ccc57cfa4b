//! JSON Project Store
//!
//! Keeps each project's record in `<root>/.devstack/project.json` and guards
//! lifecycle transitions and regeneration with an advisory lock on
//! `<root>/.devstack.lock`.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use tracing::debug;

use crate::domain::entities::ProjectRecord;
use crate::domain::ports::{ProjectStore, StoreError};
use crate::domain::value_objects::ProjectLayout;
use crate::infrastructure::fs::atomic_write;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProjectStore;

impl JsonProjectStore {
    pub fn new() -> Self {
        Self
    }
}

/// Exclusive lifecycle lock, released on drop
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl ProjectStore for JsonProjectStore {
    type Lock = ProjectLock;

    fn load(&self, project_root: &Path) -> Result<Option<ProjectRecord>, StoreError> {
        let path = ProjectLayout::new(project_root).record_file();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Access {
            path: path.clone(),
            source,
        })?;
        let record = serde_json::from_str(&content).map_err(|e| StoreError::Corrupted {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(record))
    }

    fn save(&self, project_root: &Path, record: &ProjectRecord) -> Result<(), StoreError> {
        let path = ProjectLayout::new(project_root).record_file();
        let mut content = serde_json::to_string_pretty(record).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        content.push('\n');

        atomic_write(&path, content.as_bytes())?;
        debug!(path = %path.display(), state = %record.state, "saved project record");
        Ok(())
    }

    fn try_lock(&self, project_root: &Path) -> Result<Option<ProjectLock>, StoreError> {
        let path = ProjectLayout::new(project_root).lock_file();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| StoreError::Access {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(ProjectLock { file })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(source) => Err(StoreError::Access { path, source }),
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
