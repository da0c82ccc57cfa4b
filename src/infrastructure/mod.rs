//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - Local file system with atomic writes, home directory resolution
//! - `catalog/` - Stack and service catalog loaders
//! - `repositories/` - Global registry and per-project record storage
//! - `process/` - Subprocess runner used to drive the container engine

pub mod catalog;
pub mod fs;
pub mod process;
pub mod repositories;

// Re-export for convenience
pub use catalog::{ServiceRegistry, StackRegistry};
pub use fs::LocalFs;
pub use process::SystemProcessRunner;
pub use repositories::{JsonProjectStore, JsonRegistryRepository};
