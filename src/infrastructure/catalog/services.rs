//! Service catalog (`services.json`)
//!
//! Grouped by category: `{ "<category>": { "<service>": {...} } }`. The
//! registry id of a service is `category.service`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::entities::{
    Catalog, LoadedTemplate, PortMapping, ServiceDescriptor, SkippedEntry,
};
use crate::domain::services::placeholder::is_variable_name;

use super::entries::OrderedEntries;
use super::{base_dir, is_catalog_id, load_template, read_catalog, CatalogError};

#[derive(Debug, Deserialize)]
struct RawService {
    name: String,
    #[serde(default)]
    description: String,
    stub: String,
    compatible_with: Vec<String>,
    #[serde(default)]
    volumes: Vec<String>,
    #[serde(default)]
    ports: Option<RawPorts>,
    #[serde(default)]
    default_variables: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    required_variables: Vec<String>,
    #[serde(default)]
    optional_variables: BTreeMap<String, String>,
    #[serde(default)]
    secret_variables: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPorts {
    internal: u16,
    #[serde(default)]
    external: Option<u16>,
    #[serde(default)]
    env: Option<String>,
}

/// Filter for [`ServiceRegistry::list`]
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub category: Option<String>,
    /// Only services usable with this framework
    pub framework: Option<String>,
}

impl ServiceFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    fn matches(&self, service: &ServiceDescriptor) -> bool {
        self.category.as_deref().map_or(true, |c| service.category == c)
            && self
                .framework
                .as_deref()
                .map_or(true, |f| service.is_compatible_with(f))
    }
}

/// Reusable service templates, loaded once and read-only afterwards
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    path: PathBuf,
    catalog: Catalog<ServiceDescriptor>,
}

impl ServiceRegistry {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = read_catalog(path)?;
        let catalog = parse(&content, path)?;

        debug!(path = %path.display(), services = catalog.len(), "loaded service catalog");
        for skipped in catalog.skipped() {
            warn!(service = %skipped.id, reason = %skipped.reason, "skipping service entry");
        }

        Ok(Self {
            path: path.to_path_buf(),
            catalog,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: &str) -> Result<&ServiceDescriptor, CatalogError> {
        self.catalog.get(id).ok_or_else(|| CatalogError::NotFound {
            kind: "service",
            id: id.to_string(),
            available: self.catalog.entries().iter().map(|s| s.id.clone()).collect(),
        })
    }

    pub fn list(&self, filter: &ServiceFilter) -> Vec<&ServiceDescriptor> {
        self.catalog
            .entries()
            .iter()
            .filter(|s| filter.matches(s))
            .collect()
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.catalog
            .entries()
            .iter()
            .map(|s| s.category.as_str())
            .collect()
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        self.catalog.skipped()
    }

    /// Load the stub of `service`, carrying its declared volumes along.
    pub fn load_template(&self, service: &ServiceDescriptor) -> Result<LoadedTemplate, CatalogError> {
        Ok(load_template(&service.id, &service.stub)?.with_declared_volumes(service.volumes.clone()))
    }
}

fn parse(content: &str, path: &Path) -> Result<Catalog<ServiceDescriptor>, CatalogError> {
    let raw: OrderedEntries<OrderedEntries<serde_json::Value>> = serde_json::from_str(content)
        .map_err(|e| CatalogError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let dir = base_dir(path);
    let mut skipped = Vec::new();
    let mut services = Vec::new();

    for (category, members) in raw.dedup(&mut skipped, |c| c.to_string()) {
        if !is_catalog_id(&category) {
            skipped.push(SkippedEntry {
                id: category,
                reason: "category must be lowercase letters, digits, '-' or '_'".to_string(),
            });
            continue;
        }
        for (service, value) in members.dedup(&mut skipped, |s| format!("{}.{}", category, s)) {
            let id = format!("{}.{}", category, service);
            match validate(&category, &service, value, &dir) {
                Ok(descriptor) => services.push(descriptor),
                Err(reason) => skipped.push(SkippedEntry { id, reason }),
            }
        }
    }

    Ok(Catalog::new(services, skipped))
}

fn validate(
    category: &str,
    service: &str,
    value: serde_json::Value,
    dir: &Path,
) -> Result<ServiceDescriptor, String> {
    if !is_catalog_id(service) {
        return Err("service name must be lowercase letters, digits, '-' or '_'".to_string());
    }
    let raw: RawService = serde_json::from_value(value).map_err(|e| e.to_string())?;

    if raw.name.trim().is_empty() {
        return Err("'name' is empty".to_string());
    }
    if raw.compatible_with.is_empty() {
        return Err("'compatible_with' is empty".to_string());
    }

    let ports = match raw.ports {
        Some(p) if p.internal == 0 => return Err("'ports.internal' must be non-zero".to_string()),
        Some(RawPorts { env: Some(env), .. }) if !is_variable_name(&env) => {
            return Err(format!("invalid port variable name '{}'", env));
        }
        Some(p) => Some(PortMapping {
            internal: p.internal,
            external: p.external.filter(|port| *port != 0),
            env: p.env,
        }),
        None => None,
    };

    let names = raw
        .default_variables
        .keys()
        .chain(raw.required_variables.iter())
        .chain(raw.optional_variables.keys())
        .chain(raw.secret_variables.iter());
    for name in names {
        if !is_variable_name(name) {
            return Err(format!("invalid variable name '{}'", name));
        }
    }

    let mut default_variables = BTreeMap::new();
    for (name, value) in raw.default_variables {
        let value = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return Err(format!("default for '{}' must be a scalar", name)),
        };
        default_variables.insert(name, value);
    }

    let stub = dir.join(&raw.stub);
    if !stub.is_file() {
        return Err(format!("template {} does not exist", stub.display()));
    }

    Ok(ServiceDescriptor {
        id: format!("{}.{}", category, service),
        category: category.to_string(),
        service: service.to_string(),
        name: raw.name,
        description: raw.description,
        stub,
        compatible_with: raw.compatible_with.into_iter().collect(),
        volumes: raw.volumes,
        ports,
        default_variables,
        required_variables: raw.required_variables,
        optional_variables: raw.optional_variables,
        secret_variables: raw.secret_variables,
    })
}
