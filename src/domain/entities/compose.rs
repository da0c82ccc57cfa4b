//! Composed orchestration documents
//!
//! `ComposeDocument` is the structured form of one compose file. The base
//! document holds full service definitions; an overlay holds partial patches
//! keyed by services that exist in the base.

use serde_yaml_ng::{Mapping, Value};

use crate::domain::value_objects::Environment;

/// Header written at the top of every generated compose file
pub const GENERATED_HEADER: &str =
    "# Generated by devstack. Changes are overwritten on re-initialization.\n";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeDocument {
    pub services: Mapping,
    pub volumes: Mapping,
    pub networks: Mapping,
}

impl ComposeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert(
            Value::String("services".to_string()),
            Value::Mapping(self.services.clone()),
        );
        if !self.volumes.is_empty() {
            root.insert(
                Value::String("volumes".to_string()),
                Value::Mapping(self.volumes.clone()),
            );
        }
        if !self.networks.is_empty() {
            root.insert(
                Value::String("networks".to_string()),
                Value::Mapping(self.networks.clone()),
            );
        }
        Value::Mapping(root)
    }

    /// Render as a compose file, header included.
    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        let body = serde_yaml_ng::to_string(&self.to_value())?;
        Ok(format!("{}{}", GENERATED_HEADER, body))
    }
}

/// Output of one compose build: the base plus the overlay of one environment
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedOrchestration {
    pub environment: Environment,
    pub base: ComposeDocument,
    pub overlay: ComposeDocument,
}
