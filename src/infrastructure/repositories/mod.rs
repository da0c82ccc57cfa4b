//! Repository Implementations
//!
//! Concrete implementations of domain repository ports.

mod project_store;
mod registry;

pub use project_store::{JsonProjectStore, ProjectLock};
pub use registry::{default_registry_path, JsonRegistryRepository, REGISTRY_PATH_VAR};
