//! Error types for devstack
//!
//! Each component owns a `thiserror` enum; `DevstackError` folds them together
//! for callers that drive several components at once.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entities::ProjectState;
use crate::domain::ports::{FsError, ProcessError, RegistryError, StoreError};
use crate::domain::services::{GenerationError, ParseError};
use crate::infrastructure::catalog::CatalogError;

/// Result type alias for devstack operations
pub type DevstackResult<T> = Result<T, DevstackError>;

/// A selected service cannot be used with the chosen stack or directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompatibilityError {
    #[error("service '{service}' is not compatible with stack '{stack}' (framework '{framework}')")]
    IncompatibleService {
        service: String,
        stack: String,
        framework: String,
    },

    #[error("{path} does not look like a {framework} project (expected one of: {})", .markers.join(", "))]
    NotAFrameworkProject {
        path: PathBuf,
        framework: String,
        markers: Vec<String>,
    },
}

/// Lifecycle errors. `Busy` guards concurrent commands on one project.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("project '{project}' is busy ({state}); another command is in progress")]
    Busy { project: String, state: ProjectState },

    #[error("cannot {action} project '{project}' while it is {state}")]
    IllegalTransition {
        project: String,
        state: ProjectState,
        action: &'static str,
    },

    #[error("a devstack project already exists at {path} (use --force to regenerate)")]
    AlreadyInitialized { path: PathBuf },

    #[error("no devstack project found at {path}")]
    NotInitialized { path: PathBuf },
}

/// Main error type for devstack operations
#[derive(Debug, Error)]
pub enum DevstackError {
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    FileSystem(#[from] FsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    State(#[from] StateError),

    /// The container engine could not be run or exited non-zero.
    #[error("{action} failed for project '{project}': {source}")]
    Engine {
        project: String,
        action: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("compose file not found for project at {project_root} (searched: {})", display_paths(.searched))]
    ComposeFileNotFound {
        project_root: PathBuf,
        searched: Vec<PathBuf>,
    },

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("{0}")]
    InvalidInput(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DevstackError {
    /// Captured engine stderr, when the failure came from the container engine.
    pub fn engine_stderr(&self) -> Option<&str> {
        match self {
            DevstackError::Engine {
                source: ProcessError::NonZeroExit { stderr, .. },
                ..
            } => Some(stderr.as_str()),
            _ => None,
        }
    }
}
