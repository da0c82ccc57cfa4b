//! Presentation Layer
//!
//! Wires use cases to their infrastructure for the command-line front end.
//!
//! ```ignore
//! use devstack::presentation::factory;
//!
//! let orchestrator = factory::create_orchestrator(&config);
//! orchestrator.start(&root)?;
//! ```

pub mod factory;

pub use factory::{create_orchestrator, create_registry_use_case, load_catalogs, Catalogs};
