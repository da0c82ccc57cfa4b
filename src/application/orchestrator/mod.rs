//! Lifecycle orchestration
//!
//! Drives the container engine's compose subcommand for an initialized
//! project, moving its record through the lifecycle state machine.
//! Every engine call is a single attempt; failures leave the project in
//! `ERROR` with the captured stderr in `last_error`.

mod options;
mod result;
mod use_case;

#[cfg(test)]
mod tests;

pub use options::{EngineConfig, LogOptions, DEFAULT_ENGINE_TIMEOUT};
pub use result::{parse_status, LifecycleOutcome, Publisher, ServiceStatus};
pub use use_case::Orchestrator;
