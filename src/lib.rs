//! devstack - composes container environments from framework and service templates
//!
//! A project is initialized from one stack (framework template) plus any number
//! of catalog services. devstack merges their templates into compose files and
//! a variable file under `.devstack/`, records the project, and then drives its
//! lifecycle through the container engine's compose subcommand.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    InitMode, InitOptions, InitResult, LifecycleOutcome, LogOptions, Orchestrator,
    ProjectInitializer, RegistryUseCase, ServiceStatus,
};
pub use config::Config;
pub use domain::entities::{ProjectRecord, ProjectState};
pub use domain::value_objects::{Environment, ProjectName};
pub use error::{DevstackError, DevstackResult};
