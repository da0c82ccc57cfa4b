//! Project Initialization
//!
//! Turns a stack and a service selection into a ready-to-start project:
//!
//! - Checking compatibility and the target directory
//! - Allocating host ports
//! - Building the compose files and the variable file
//! - Staging everything and moving it into `.devstack/` in one rename
//! - Creating the project record and mirroring it into the global registry

mod options;
mod result;
mod use_case;


pub use options::{InitMode, InitOptions, DEFAULT_PORT_RANGE};
pub use result::InitResult;
pub use use_case::ProjectInitializer;
