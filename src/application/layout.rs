//! Compose file resolution
//!
//! Finds the files a lifecycle command passes to the engine, preferring the
//! current `.devstack/` layout and falling back to files at the project root.

use std::path::PathBuf;

use crate::domain::ports::FileSystem;
use crate::domain::value_objects::{Environment, ProjectLayout};
use crate::error::{DevstackError, DevstackResult};

/// Files handed to the container engine for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeFiles {
    pub base: PathBuf,
    pub overlay: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

impl ComposeFiles {
    /// `-f` arguments in the order the engine must merge them
    pub fn file_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.base.display().to_string()];
        if let Some(overlay) = &self.overlay {
            args.push("-f".to_string());
            args.push(overlay.display().to_string());
        }
        if let Some(env_file) = &self.env_file {
            args.push("--env-file".to_string());
            args.push(env_file.display().to_string());
        }
        args
    }
}

/// Locate the base file, then the overlay and variable file next to it.
pub fn resolve_compose_files<FS: FileSystem + ?Sized>(
    fs: &FS,
    layout: &ProjectLayout,
    environment: Environment,
) -> DevstackResult<ComposeFiles> {
    let candidates = [
        (
            layout.base_file(),
            layout.overlay_file(environment),
            layout.env_file(),
        ),
        (
            layout.legacy_base_file(),
            layout.legacy_overlay_file(environment),
            layout.legacy_env_file(),
        ),
    ];

    for (base, overlay, env_file) in &candidates {
        if fs.exists(base) {
            return Ok(ComposeFiles {
                base: base.clone(),
                overlay: fs.exists(overlay).then(|| overlay.clone()),
                env_file: fs.exists(env_file).then(|| env_file.clone()),
            });
        }
    }

    Err(DevstackError::ComposeFileNotFound {
        project_root: layout.root().to_path_buf(),
        searched: candidates.into_iter().map(|(base, _, _)| base).collect(),
    })
}
