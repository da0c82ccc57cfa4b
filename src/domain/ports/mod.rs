//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod file_system;
pub mod process_runner;
pub mod project_store;
pub mod registry_repository;

pub use file_system::{FileSystem, FsError, FsResult};
pub use process_runner::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner};
pub use project_store::{ProjectStore, StoreError};
pub use registry_repository::{RegistryError, RegistryRepository};
