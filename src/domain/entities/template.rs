//! Template document entity
//!
//! A stub file split into named sections. Section order is the order of first
//! appearance in the file.

use std::path::PathBuf;

/// Section holding base service definitions
pub const SECTION_BASE: &str = "base";
/// Section holding development overlay patches
pub const SECTION_DEV: &str = "dev";
/// Section holding production overlay patches
pub const SECTION_PROD: &str = "prod";
/// Section holding named volume definitions
pub const SECTION_VOLUMES: &str = "volumes";
/// Section holding `KEY=VALUE` variable lines
pub const SECTION_ENV: &str = "env";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDocument {
    sections: Vec<(String, String)>,
}

impl TemplateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `body` to a section, creating it on first use.
    pub fn push_section(&mut self, name: impl Into<String>, body: impl Into<String>) {
        let name = name.into();
        let body = body.into();
        if let Some((_, existing)) = self.sections.iter_mut().find(|(n, _)| *n == name) {
            if !existing.is_empty() && !body.is_empty() {
                existing.push('\n');
            }
            existing.push_str(&body);
        } else {
            self.sections.push((name, body));
        }
    }

    pub fn with_section(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.push_section(name, body);
        self
    }

    pub fn section(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
    }

    /// Section body, or `None` when the section is missing or whitespace only.
    pub fn non_empty_section(&self, name: &str) -> Option<&str> {
        self.section(name).filter(|body| !body.trim().is_empty())
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A parsed stub together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTemplate {
    /// Stack id or `category.service` id
    pub id: String,
    pub path: PathBuf,
    pub document: TemplateDocument,
    /// Named volumes the catalog entry says it uses
    pub declared_volumes: Vec<String>,
}

impl LoadedTemplate {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, document: TemplateDocument) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            document,
            declared_volumes: Vec::new(),
        }
    }

    pub fn with_declared_volumes(mut self, volumes: Vec<String>) -> Self {
        self.declared_volumes = volumes;
        self
    }
}
