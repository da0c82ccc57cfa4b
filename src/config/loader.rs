//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::ports::FsError;
use crate::error::{DevstackError, DevstackResult};
use crate::infrastructure::fs::devstack_user_dir;
use crate::infrastructure::repositories::{default_registry_path, REGISTRY_PATH_VAR};

use super::types::Config;

pub const CONFIG_FILE: &str = "config.toml";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> DevstackResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|e| FsError::at(path, e))?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| DevstackError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    validate(&config, path)?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                key: key.clone(),
                file: path.to_path_buf(),
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load from an explicit path, the user config, or defaults.
///
/// An explicit path must exist; the user config is optional.
pub fn load_or_default(explicit: Option<&Path>) -> DevstackResult<(Config, Vec<ConfigWarning>)> {
    let (config, warnings) = match explicit {
        Some(path) => load_with_warnings(path)?,
        None => {
            let user_config = devstack_user_dir().join(CONFIG_FILE);
            if user_config.is_file() {
                load_with_warnings(&user_config)?
            } else {
                debug!(path = %user_config.display(), "no user config; using defaults");
                (Config::default(), Vec::new())
            }
        }
    };
    let mut config = with_env_overrides(config);
    config.registry_path.get_or_insert_with(default_registry_path);
    Ok((config, warnings))
}

/// Apply environment variable overrides (DEVSTACK_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| std::env::var(key).ok())
}

pub(super) fn apply_overrides(
    mut config: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Config {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    // DEVSTACK_ENGINE (whitespace-separated command)
    if let Some(engine) = var("DEVSTACK_ENGINE") {
        config.engine.command = engine.split_whitespace().map(str::to_string).collect();
    }

    // DEVSTACK_TIMEOUT (seconds)
    if let Some(timeout) = var("DEVSTACK_TIMEOUT") {
        match timeout.trim().parse() {
            Ok(secs) => config.engine.timeout_secs = secs,
            Err(_) => debug!(value = %timeout, "ignoring invalid DEVSTACK_TIMEOUT"),
        }
    }

    // DEVSTACK_TEMPLATES
    if let Some(dir) = var("DEVSTACK_TEMPLATES") {
        config.templates.dir = Some(PathBuf::from(dir));
    }

    // DEVSTACK_LOG
    if let Some(level) = var("DEVSTACK_LOG") {
        config.log_level = Some(level);
    }

    // DEVSTACK_REGISTRY_PATH
    if let Some(path) = var(REGISTRY_PATH_VAR) {
        config.registry_path = Some(PathBuf::from(path));
    }

    config
}

fn validate(config: &Config, path: &Path) -> DevstackResult<()> {
    let invalid = |message: &str| DevstackError::Config {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    if config.engine.command.is_empty() {
        return Err(invalid("engine.command must not be empty"));
    }
    if config.ports.range_start == 0 || config.ports.range_start > config.ports.range_end {
        return Err(invalid(
            "ports.range_start must be non-zero and not above ports.range_end",
        ));
    }
    Ok(())
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "engine",
        "command",
        "timeout_secs",
        "templates",
        "dir",
        "ports",
        "range_start",
        "range_end",
        "defaults",
        "environment",
        "log_level",
        "registry_path",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_bytes.len()]
}
