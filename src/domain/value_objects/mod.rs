//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod environment;
mod hash;
mod project_layout;
mod project_name;

pub use environment::Environment;
pub use hash::ContentHash;
pub use project_layout::{
    ProjectLayout, BASE_FILE, ENV_FILE, LOCK_FILE, PRIVATE_DIR, RECORD_FILE,
};
pub use project_name::ProjectName;
