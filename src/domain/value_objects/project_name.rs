//! Project name value object
//!
//! The name is passed to the engine as the compose project name, so it is kept
//! to lowercase letters, digits, `-` and `_`, starting with a letter or digit.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Validate an explicit name.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let valid_start = raw
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        let valid_rest = raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

        if valid_start && valid_rest {
            Ok(Self(raw.to_string()))
        } else {
            Err(format!(
                "invalid project name '{}': use lowercase letters, digits, '-' or '_'",
                raw
            ))
        }
    }

    /// Derive a name from a directory, slugifying whatever it is called.
    pub fn from_dir(path: &Path) -> Self {
        let raw = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::slugify(&raw)
    }

    pub fn slugify(raw: &str) -> Self {
        let mut slug = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if matches!(c, '-' | '_') {
                slug.push(c);
            } else if !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_matches(|c| c == '-' || c == '_').to_string();
        if slug.is_empty() {
            Self("project".to_string())
        } else {
            Self(slug)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
