//! Common test utilities for devstack CLI tests.
//!
//! - `TestEnv`: isolated home, registry and workspace directories
//! - `FakeEngine`: a shell script standing in for `docker compose` (unix)

pub mod env;
#[cfg(unix)]
pub mod engine;

pub use env::*;
#[cfg(unix)]
pub use engine::*;
