//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `ProjectInitializer` - Generates a project's compose files, variable file and record
//! - `Orchestrator` - Start/stop/restart/status/logs through the container engine
//! - `RegistryUseCase` - Lists and maintains the global project index

pub mod initialize;
pub mod layout;
pub mod orchestrator;
pub mod registry;

pub use initialize::{InitMode, InitOptions, InitResult, ProjectInitializer, DEFAULT_PORT_RANGE};
pub use layout::{resolve_compose_files, ComposeFiles};
pub use orchestrator::{
    parse_status, EngineConfig, LifecycleOutcome, LogOptions, Orchestrator, Publisher,
    ServiceStatus, DEFAULT_ENGINE_TIMEOUT,
};
pub use registry::{RegisteredProject, RegistryUseCase};
