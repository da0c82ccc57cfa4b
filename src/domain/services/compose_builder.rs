//! Compose builder
//!
//! Merges the stack template and the selected service templates into a base
//! compose document and one environment overlay:
//!
//! 1. `base` and `volumes` sections are merged in order. A service or volume
//!    name that is already present is fatal; nothing is overwritten.
//! 2. The environment's sections (`dev` or `prod`) are merged as patches into
//!    the overlay only. Patching a service the base does not define is fatal.
//! 3. Build-time `{{NAME}}` tokens are replaced in every consumed section;
//!    runtime `${NAME:-default}` tokens pass through untouched.
//!
//! The stack template must come first, followed by services in selection
//! order. The builder is pure: writing the result is the caller's job.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_yaml_ng::{Mapping, Value};
use thiserror::Error;

use crate::domain::entities::{
    ComposeDocument, ComposedOrchestration, LoadedTemplate, SECTION_BASE, SECTION_VOLUMES,
};
use crate::domain::value_objects::Environment;

use super::placeholder;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("service '{service}' from '{template}' ({path}) is already defined by '{defined_by}'")]
    DuplicateService {
        service: String,
        template: String,
        defined_by: String,
        path: PathBuf,
    },

    #[error("volume '{volume}' from '{template}' ({path}) is already defined by '{defined_by}'")]
    DuplicateVolume {
        volume: String,
        template: String,
        defined_by: String,
        path: PathBuf,
    },

    #[error("network '{network}' from '{template}' ({path}) conflicts with an earlier definition")]
    ConflictingNetwork {
        network: String,
        template: String,
        path: PathBuf,
    },

    #[error("{environment} overlay in '{template}' ({path}) patches service '{service}', which no base section defines")]
    OrphanOverlay {
        service: String,
        environment: Environment,
        template: String,
        path: PathBuf,
    },

    #[error("unresolved placeholder(s) {} in '{template}' ({path})", braced(.names))]
    UnresolvedPlaceholder {
        names: Vec<String>,
        template: String,
        path: PathBuf,
    },

    #[error("invalid '{section}' section in '{template}' ({path}): {message}")]
    InvalidFragment {
        section: String,
        template: String,
        path: PathBuf,
        message: String,
    },

    #[error("required variable '{name}' of '{template}' has no value")]
    MissingRequiredVariable { name: String, template: String },

    #[error("no free host port for '{service}' (preferred {preferred})")]
    NoFreePort { service: String, preferred: u16 },

    #[error("failed to render {file}: {message}")]
    Render { file: String, message: String },
}

/// Accumulates merged definitions and remembers who defined each name.
#[derive(Default)]
struct MergeState {
    doc: ComposeDocument,
    service_owner: BTreeMap<String, String>,
    volume_owner: BTreeMap<String, String>,
}

/// Build the base document and the overlay for `environment`.
pub fn build(
    templates: &[LoadedTemplate],
    environment: Environment,
    values: &BTreeMap<String, String>,
) -> Result<ComposedOrchestration, GenerationError> {
    let base = merge_base(templates, values)?;
    let overlay = merge_overlay(templates, environment, values, &base)?;

    Ok(ComposedOrchestration {
        environment,
        base: base.doc,
        overlay,
    })
}

fn merge_base(
    templates: &[LoadedTemplate],
    values: &BTreeMap<String, String>,
) -> Result<MergeState, GenerationError> {
    let mut state = MergeState::default();

    for template in templates {
        if let Some(mapping) = section_mapping(template, SECTION_BASE, values)? {
            let fragment = split_fragment(mapping);
            for (name, definition) in fragment.services {
                let name = key_name(&name, template, SECTION_BASE)?;
                if let Some(defined_by) = state.service_owner.get(&name) {
                    return Err(GenerationError::DuplicateService {
                        service: name,
                        template: template.id.clone(),
                        defined_by: defined_by.clone(),
                        path: template.path.clone(),
                    });
                }
                state.service_owner.insert(name.clone(), template.id.clone());
                state.doc.services.insert(Value::String(name), definition);
            }
            add_volumes(&mut state, template, fragment.volumes)?;
            add_networks(&mut state.doc.networks, template, fragment.networks)?;
        }

        if let Some(volumes) = section_mapping(template, SECTION_VOLUMES, values)? {
            add_volumes(&mut state, template, volumes)?;
        }
    }

    for template in templates {
        for volume in &template.declared_volumes {
            if !state.volume_owner.contains_key(volume) {
                state
                    .volume_owner
                    .insert(volume.clone(), template.id.clone());
                state
                    .doc
                    .volumes
                    .insert(Value::String(volume.clone()), Value::Null);
            }
        }
    }

    Ok(state)
}

fn merge_overlay(
    templates: &[LoadedTemplate],
    environment: Environment,
    values: &BTreeMap<String, String>,
    base: &MergeState,
) -> Result<ComposeDocument, GenerationError> {
    let mut overlay = ComposeDocument::new();
    let mut overlay_volumes: BTreeMap<String, String> = BTreeMap::new();

    for template in templates {
        let Some(mapping) = section_mapping(template, environment.section(), values)? else {
            continue;
        };
        let fragment = split_fragment(mapping);

        for (name, patch) in fragment.services {
            let name = key_name(&name, template, environment.section())?;
            if !base.doc.has_service(&name) {
                return Err(GenerationError::OrphanOverlay {
                    service: name,
                    environment,
                    template: template.id.clone(),
                    path: template.path.clone(),
                });
            }
            let key = Value::String(name);
            match overlay.services.get_mut(&key) {
                Some(existing) => deep_merge(existing, patch),
                None => {
                    overlay.services.insert(key, patch);
                }
            }
        }

        for (name, definition) in fragment.volumes {
            let name = key_name(&name, template, environment.section())?;
            let defined_by = base
                .volume_owner
                .get(&name)
                .or_else(|| overlay_volumes.get(&name));
            if let Some(defined_by) = defined_by {
                return Err(GenerationError::DuplicateVolume {
                    volume: name,
                    template: template.id.clone(),
                    defined_by: defined_by.clone(),
                    path: template.path.clone(),
                });
            }
            overlay_volumes.insert(name.clone(), template.id.clone());
            overlay.volumes.insert(Value::String(name), definition);
        }

        add_networks(&mut overlay.networks, template, fragment.networks)?;
    }

    Ok(overlay)
}

fn add_volumes(
    state: &mut MergeState,
    template: &LoadedTemplate,
    volumes: Mapping,
) -> Result<(), GenerationError> {
    for (name, definition) in volumes {
        let name = key_name(&name, template, SECTION_VOLUMES)?;
        if let Some(defined_by) = state.volume_owner.get(&name) {
            return Err(GenerationError::DuplicateVolume {
                volume: name,
                template: template.id.clone(),
                defined_by: defined_by.clone(),
                path: template.path.clone(),
            });
        }
        state.volume_owner.insert(name.clone(), template.id.clone());
        state.doc.volumes.insert(Value::String(name), definition);
    }
    Ok(())
}

/// Networks are shared: identical redeclarations are fine, different ones are not.
fn add_networks(
    networks: &mut Mapping,
    template: &LoadedTemplate,
    incoming: Mapping,
) -> Result<(), GenerationError> {
    for (name, definition) in incoming {
        match networks.get(&name) {
            Some(existing) if *existing == definition => {}
            Some(_) => {
                return Err(GenerationError::ConflictingNetwork {
                    network: key_name(&name, template, "networks")?,
                    template: template.id.clone(),
                    path: template.path.clone(),
                });
            }
            None => {
                networks.insert(name, definition);
            }
        }
    }
    Ok(())
}

struct Fragment {
    services: Mapping,
    volumes: Mapping,
    networks: Mapping,
}

/// A section either lists services directly or, in legacy stubs, is a whole
/// compose document with a `services` key.
fn split_fragment(mut mapping: Mapping) -> Fragment {
    let is_document = matches!(mapping.get("services"), Some(Value::Mapping(_)));
    if !is_document {
        return Fragment {
            services: mapping,
            volumes: Mapping::new(),
            networks: Mapping::new(),
        };
    }

    let mut take = |key: &str| match mapping.remove(key) {
        Some(Value::Mapping(m)) => m,
        _ => Mapping::new(),
    };
    Fragment {
        services: take("services"),
        volumes: take("volumes"),
        networks: take("networks"),
    }
}

/// Substitute and parse one section. `None` when the section is absent or empty.
fn section_mapping(
    template: &LoadedTemplate,
    section: &str,
    values: &BTreeMap<String, String>,
) -> Result<Option<Mapping>, GenerationError> {
    let Some(raw) = template.document.non_empty_section(section) else {
        return Ok(None);
    };

    let text = placeholder::substitute(raw, values).map_err(|names| {
        GenerationError::UnresolvedPlaceholder {
            names,
            template: template.id.clone(),
            path: template.path.clone(),
        }
    })?;

    let invalid = |message: String| GenerationError::InvalidFragment {
        section: section.to_string(),
        template: template.id.clone(),
        path: template.path.clone(),
        message,
    };

    match serde_yaml_ng::from_str::<Value>(&dedent(&text)) {
        Ok(Value::Mapping(mapping)) => Ok(Some(mapping)),
        Ok(Value::Null) => Ok(None),
        Ok(_) => Err(invalid("expected a mapping of names to definitions".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn key_name(key: &Value, template: &LoadedTemplate, section: &str) -> Result<String, GenerationError> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| GenerationError::InvalidFragment {
            section: section.to_string(),
            template: template.id.clone(),
            path: template.path.clone(),
            message: format!("names must be strings, found {:?}", key),
        })
}

/// Patch `target` with `patch`: mappings merge recursively, sequences gain
/// the items they lack, anything else is replaced.
fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Mapping(target), Value::Mapping(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Sequence(target), Value::Sequence(patch)) => {
            for item in patch {
                if !target.contains(&item) {
                    target.push(item);
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Strip the indentation shared by every non-blank line, counted in chars.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| strip_indent(l, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `line` without up to `indent` leading whitespace chars.
fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take(indent)
        .take_while(|(_, c)| c.is_whitespace())
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    &line[cut..]
}

fn braced(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("{{{{{}}}}}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests;
