//! Catalog entities
//!
//! Stack manifests and service descriptors are validated once at catalog load
//! and never change afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Anything addressable by id inside a catalog
pub trait CatalogEntry {
    fn id(&self) -> &str;
}

/// A framework template describing a project's baseline topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackManifest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub framework: String,
    pub runtime: String,
    /// Absolute path of the stub file
    pub stub: PathBuf,
    pub version: String,
    /// Relative paths that identify an existing project of this framework
    pub markers: Vec<String>,
    /// Variables that must be unique per installation
    pub secret_variables: Vec<String>,
}

impl CatalogEntry for StackManifest {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Host port exposure of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub internal: u16,
    /// Preferred host port; `None` keeps the service internal
    pub external: Option<u16>,
    /// Variable carrying the chosen host port
    pub env: Option<String>,
}

/// A reusable infrastructure component (`category.service`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub id: String,
    pub category: String,
    pub service: String,
    pub name: String,
    pub description: String,
    /// Absolute path of the stub file
    pub stub: PathBuf,
    pub compatible_with: BTreeSet<String>,
    pub volumes: Vec<String>,
    pub ports: Option<PortMapping>,
    pub default_variables: BTreeMap<String, String>,
    pub required_variables: Vec<String>,
    /// Variable name -> what setting it does
    pub optional_variables: BTreeMap<String, String>,
    pub secret_variables: Vec<String>,
}

impl ServiceDescriptor {
    pub fn is_compatible_with(&self, framework: &str) -> bool {
        self.compatible_with.contains(framework) || self.compatible_with.contains("*")
    }

    /// Name of the variable holding this service's host port, if it has one.
    pub fn port_variable(&self) -> Option<String> {
        let ports = self.ports.as_ref()?;
        ports.external?;
        Some(
            ports
                .env
                .clone()
                .unwrap_or_else(|| format!("{}_PORT", self.service.to_uppercase().replace('-', "_"))),
        )
    }
}

impl CatalogEntry for ServiceDescriptor {
    fn id(&self) -> &str {
        &self.id
    }
}

/// An entry dropped during catalog load, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub id: String,
    pub reason: String,
}

/// Loaded catalog: usable entries in file order plus what was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog<T> {
    entries: Vec<T>,
    skipped: Vec<SkippedEntry>,
}

impl<T: CatalogEntry> Catalog<T> {
    pub fn new(entries: Vec<T>, skipped: Vec<SkippedEntry>) -> Self {
        Self { entries, skipped }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }
}
