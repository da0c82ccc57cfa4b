//! Domain Entities
//!
//! - `TemplateDocument` - A stub split into named sections
//! - `StackManifest` / `ServiceDescriptor` - Catalog entries
//! - `ComposeDocument` - A generated compose file
//! - `EnvFile` - A generated variable file
//! - `ProjectRecord` - Persisted identity and lifecycle state of a project
//! - `Registry` - Global discovery index of projects

mod catalog;
mod compose;
mod env_file;
mod project;
mod registry;
mod template;

pub use catalog::{Catalog, CatalogEntry, PortMapping, ServiceDescriptor, SkippedEntry, StackManifest};
pub use compose::{ComposeDocument, ComposedOrchestration, GENERATED_HEADER};
pub use env_file::EnvFile;
pub use project::{LifecycleAction, ProjectRecord, ProjectState, TransitionDecision};
pub use registry::{ProjectSummary, Registry};
pub use template::{
    LoadedTemplate, TemplateDocument, SECTION_BASE, SECTION_DEV, SECTION_ENV, SECTION_PROD,
    SECTION_VOLUMES,
};
