//! Domain Services
//!
//! Pure business logic that operates on domain entities.
//! No I/O: callers load templates and persist results.

pub mod compose_builder;
pub mod env_generator;
pub mod placeholder;
pub mod port_allocator;
pub mod stub_parser;

pub use compose_builder::GenerationError;
pub use env_generator::{EnvSource, EnvWarning, GeneratedEnv};
pub use port_allocator::PortRequest;
pub use stub_parser::ParseError;
