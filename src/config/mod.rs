//! Configuration module for devstack
//!
//! Resolution order:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (DEVSTACK_*)
//! 3. `--config <path>`, else `<home>/.devstack/config.toml`
//! 4. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{ConfigWarning, CONFIG_FILE};
pub use types::{Config, DefaultsConfig, EngineSection, PortsConfig, TemplatesConfig};
