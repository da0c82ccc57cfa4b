//! Template catalogs
//!
//! `stacks.json` and `services.json` describe the templates devstack can
//! compose. Entries are validated when the file is loaded; a bad entry is
//! skipped with a reason instead of failing the whole catalog.

mod entries;
mod services;
mod stacks;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entities::LoadedTemplate;
use crate::domain::services::{stub_parser, ParseError};

pub use services::{ServiceFilter, ServiceRegistry};
pub use stacks::{StackFilter, StackRegistry};

/// File name of the stack catalog inside a templates directory
pub const STACKS_FILE: &str = "stacks.json";
/// File name of the service catalog inside a templates directory
pub const SERVICES_FILE: &str = "services.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown {kind} '{id}' (available: {})", .available.join(", "))]
    NotFound {
        kind: &'static str,
        id: String,
        available: Vec<String>,
    },

    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog {path} is malformed: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("failed to read template for '{id}' at {path}: {source}")]
    TemplateRead {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template for '{id}' at {path} is invalid: {source}")]
    TemplateParse {
        id: String,
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Read and parse the stub of catalog entry `id`.
pub fn load_template(id: &str, path: &Path) -> Result<LoadedTemplate, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::TemplateRead {
        id: id.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    let document = stub_parser::parse(&raw).map_err(|source| CatalogError::TemplateParse {
        id: id.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    Ok(LoadedTemplate::new(id, path, document))
}

fn read_catalog(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory the `stub` fields of a catalog are relative to.
fn base_dir(catalog_path: &Path) -> PathBuf {
    catalog_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn is_catalog_id(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
