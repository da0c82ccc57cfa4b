//! Stack catalog (`stacks.json`)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::entities::{Catalog, LoadedTemplate, SkippedEntry, StackManifest};
use crate::domain::services::placeholder::is_variable_name;

use super::entries::OrderedEntries;
use super::{base_dir, is_catalog_id, load_template, read_catalog, CatalogError};

#[derive(Debug, Deserialize)]
struct RawStack {
    name: String,
    #[serde(default)]
    description: String,
    framework: String,
    #[serde(default)]
    runtime: String,
    stub: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    markers: Vec<String>,
    #[serde(default)]
    secret_variables: Vec<String>,
}

/// Filter for [`StackRegistry::list`]
#[derive(Debug, Clone, Default)]
pub struct StackFilter {
    pub framework: Option<String>,
}

impl StackFilter {
    pub fn framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }
}

/// Framework templates, loaded once and read-only afterwards
#[derive(Debug, Clone)]
pub struct StackRegistry {
    path: PathBuf,
    catalog: Catalog<StackManifest>,
}

impl StackRegistry {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = read_catalog(path)?;
        let catalog = parse(&content, path)?;

        debug!(path = %path.display(), stacks = catalog.len(), "loaded stack catalog");
        for skipped in catalog.skipped() {
            warn!(stack = %skipped.id, reason = %skipped.reason, "skipping stack entry");
        }

        Ok(Self {
            path: path.to_path_buf(),
            catalog,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: &str) -> Result<&StackManifest, CatalogError> {
        self.catalog.get(id).ok_or_else(|| CatalogError::NotFound {
            kind: "stack",
            id: id.to_string(),
            available: self.catalog.entries().iter().map(|s| s.id.clone()).collect(),
        })
    }

    pub fn list(&self, filter: &StackFilter) -> Vec<&StackManifest> {
        self.catalog
            .entries()
            .iter()
            .filter(|s| filter.framework.as_deref().map_or(true, |f| s.framework == f))
            .collect()
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        self.catalog.skipped()
    }

    pub fn load_template(&self, stack: &StackManifest) -> Result<LoadedTemplate, CatalogError> {
        load_template(&stack.id, &stack.stub)
    }
}

fn parse(content: &str, path: &Path) -> Result<Catalog<StackManifest>, CatalogError> {
    let raw: OrderedEntries<serde_json::Value> =
        serde_json::from_str(content).map_err(|e| CatalogError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let dir = base_dir(path);
    let mut skipped = Vec::new();
    let mut stacks = Vec::new();

    for (id, value) in raw.dedup(&mut skipped, str::to_string) {
        match validate(&id, value, &dir) {
            Ok(stack) => stacks.push(stack),
            Err(reason) => skipped.push(SkippedEntry { id, reason }),
        }
    }

    Ok(Catalog::new(stacks, skipped))
}

fn validate(id: &str, value: serde_json::Value, dir: &Path) -> Result<StackManifest, String> {
    if !is_catalog_id(id) {
        return Err("id must be lowercase letters, digits, '-' or '_'".to_string());
    }
    let raw: RawStack = serde_json::from_value(value).map_err(|e| e.to_string())?;

    if raw.name.trim().is_empty() {
        return Err("'name' is empty".to_string());
    }
    if !is_catalog_id(&raw.framework) {
        return Err(format!("invalid framework '{}'", raw.framework));
    }
    if let Some(bad) = raw.secret_variables.iter().find(|v| !is_variable_name(v)) {
        return Err(format!("invalid secret variable name '{}'", bad));
    }

    let stub = dir.join(&raw.stub);
    if !stub.is_file() {
        return Err(format!("template {} does not exist", stub.display()));
    }

    Ok(StackManifest {
        id: id.to_string(),
        name: raw.name,
        description: raw.description,
        framework: raw.framework,
        runtime: raw.runtime,
        stub,
        version: raw.version,
        markers: raw.markers,
        secret_variables: raw.secret_variables,
    })
}
