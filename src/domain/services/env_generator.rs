//! Variable file generation
//!
//! Builds the project's `.env` from the `env` sections of the stack and the
//! selected services, in that order. The first declaration of a key wins;
//! later ones are reported as warnings and dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;

use crate::domain::entities::{EnvFile, LoadedTemplate, SECTION_ENV};

use super::compose_builder::GenerationError;
use super::placeholder;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$").expect("valid regex")
});

const SECRET_BYTES: usize = 32;

/// One contributor to the variable file
#[derive(Debug, Clone)]
pub struct EnvSource<'a> {
    pub template: &'a LoadedTemplate,
    /// Applied after the template's own `env` section
    pub default_variables: Option<&'a BTreeMap<String, String>>,
    pub required_variables: &'a [String],
    /// Freshly generated for every project unless overridden
    pub secret_variables: &'a [String],
}

impl<'a> EnvSource<'a> {
    pub fn new(template: &'a LoadedTemplate) -> Self {
        Self {
            template,
            default_variables: None,
            required_variables: &[],
            secret_variables: &[],
        }
    }

    pub fn with_defaults(mut self, defaults: &'a BTreeMap<String, String>) -> Self {
        self.default_variables = Some(defaults);
        self
    }

    pub fn with_required(mut self, required: &'a [String]) -> Self {
        self.required_variables = required;
        self
    }

    pub fn with_secrets(mut self, secrets: &'a [String]) -> Self {
        self.secret_variables = secrets;
        self
    }
}

/// Non-fatal problems found while generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvWarning {
    /// A later template declared a key that was already set
    Collision {
        key: String,
        kept_from: String,
        ignored_from: String,
    },
    /// A line in an `env` section that is not `KEY=VALUE`
    MalformedLine { template: String, line: String },
}

impl fmt::Display for EnvWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvWarning::Collision {
                key,
                kept_from,
                ignored_from,
            } => write!(
                f,
                "variable '{}' from '{}' ignored; already set by '{}'",
                key, ignored_from, kept_from
            ),
            EnvWarning::MalformedLine { template, line } => {
                write!(f, "ignoring malformed line in '{}': {}", template, line)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEnv {
    pub file: EnvFile,
    pub warnings: Vec<EnvWarning>,
}

/// Generate with secrets from [`random_secret`].
pub fn generate(
    sources: &[EnvSource<'_>],
    values: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> Result<GeneratedEnv, GenerationError> {
    generate_with(sources, values, overrides, random_secret)
}

/// Generate the variable file.
///
/// `values` resolves build-time tokens inside `env` sections. `overrides`
/// replace declared values (and resolve runtime-token values); keys nobody
/// declared are appended in sorted order.
pub fn generate_with(
    sources: &[EnvSource<'_>],
    values: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
    mut secret: impl FnMut() -> String,
) -> Result<GeneratedEnv, GenerationError> {
    let mut file = EnvFile::new();
    let mut owner: BTreeMap<String, String> = BTreeMap::new();
    let mut warnings = Vec::new();

    for source in sources {
        let template = source.template;
        if let Some(raw) = template.document.non_empty_section(SECTION_ENV) {
            let text = placeholder::substitute(raw, values).map_err(|names| {
                GenerationError::UnresolvedPlaceholder {
                    names,
                    template: template.id.clone(),
                    path: template.path.clone(),
                }
            })?;

            for line in text.lines() {
                match parse_line(line) {
                    Line::Skip => {}
                    Line::Malformed => warnings.push(EnvWarning::MalformedLine {
                        template: template.id.clone(),
                        line: line.trim().to_string(),
                    }),
                    Line::Pair(key, value) => {
                        let value = project(&value, overrides);
                        if file.insert_if_absent(key, &value) {
                            owner.insert(key.to_string(), template.id.clone());
                        } else {
                            warnings.push(EnvWarning::Collision {
                                key: key.to_string(),
                                kept_from: owner.get(key).cloned().unwrap_or_default(),
                                ignored_from: template.id.clone(),
                            });
                        }
                    }
                }
            }
        }

        if let Some(defaults) = source.default_variables {
            for (key, value) in defaults {
                if file.insert_if_absent(key, &project(value, overrides)) {
                    owner.insert(key.clone(), template.id.clone());
                }
            }
        }
    }

    for source in sources {
        for key in source.secret_variables {
            if !overrides.contains_key(key) {
                file.set(key, &secret());
            }
        }
    }

    for (key, value) in overrides {
        file.set(key, value);
    }

    for source in sources {
        for name in source.required_variables {
            if file.get(name).map_or(true, str::is_empty) {
                return Err(GenerationError::MissingRequiredVariable {
                    name: name.clone(),
                    template: source.template.id.clone(),
                });
            }
        }
    }

    Ok(GeneratedEnv { file, warnings })
}

/// 256 bits from the OS random source, hex encoded.
pub fn random_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

enum Line<'a> {
    Skip,
    Malformed,
    Pair(&'a str, String),
}

fn parse_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Skip;
    }
    match ASSIGNMENT.captures(trimmed) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(key), Some(value)) => {
                Line::Pair(key.as_str(), unquote(value.as_str()).to_string())
            }
            _ => Line::Malformed,
        },
        None => Line::Malformed,
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// A whole-value runtime token becomes its override or its literal default.
fn project(value: &str, overrides: &BTreeMap<String, String>) -> String {
    match placeholder::runtime_token(value) {
        Some(token) => overrides
            .get(token.name)
            .cloned()
            .unwrap_or_else(|| token.default.unwrap_or_default().to_string()),
        None => value.to_string(),
    }
}
