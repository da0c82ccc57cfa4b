//! Placeholder handling
//!
//! Two token forms appear in templates:
//!
//! - build-time `{{NAME}}`, replaced by devstack before anything is written;
//! - runtime `${NAME}`, `${NAME:-default}` or `${NAME-default}`, left for the
//!   container engine to resolve when containers start.
//!
//! Double-brace text whose inner part is not a plain name (for example Go
//! template expressions such as `{{.Name}}`) is not a build-time token.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static BUILD_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("valid regex")
});

static RUNTIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?-)([^}]*))?\}$").expect("valid regex")
});

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// A runtime token spanning a whole value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeToken<'a> {
    pub name: &'a str,
    pub default: Option<&'a str>,
}

/// Replace every build-time token from `values`.
///
/// Returns the names without a value (sorted, deduplicated) when any remain.
pub fn substitute(text: &str, values: &BTreeMap<String, String>) -> Result<String, Vec<String>> {
    let mut missing: Vec<String> = Vec::new();
    let out = BUILD_TIME.replace_all(text, |caps: &Captures<'_>| match values.get(&caps[1]) {
        Some(value) => value.clone(),
        None => {
            missing.push(caps[1].to_string());
            caps[0].to_string()
        }
    });

    if missing.is_empty() {
        Ok(out.into_owned())
    } else {
        missing.sort();
        missing.dedup();
        Err(missing)
    }
}

/// Names of every build-time token in `text`, in order of first appearance.
pub fn build_time_tokens(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in BUILD_TIME.captures_iter(text) {
        if !names.iter().any(|n| n == &caps[1]) {
            names.push(caps[1].to_string());
        }
    }
    names
}

/// Parse `value` when it consists of exactly one runtime token.
pub fn runtime_token(value: &str) -> Option<RuntimeToken<'_>> {
    let caps = RUNTIME.captures(value.trim())?;
    Some(RuntimeToken {
        name: caps.get(1)?.as_str(),
        default: caps.get(3).map(|m| m.as_str()),
    })
}

/// `[A-Za-z_][A-Za-z0-9_]*`, the shape of an environment variable name.
pub fn is_variable_name(s: &str) -> bool {
    VARIABLE_NAME.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_tokens() {
        let out = substitute(
            "container_name: {{PROJECT_NAME}}_app # {{ PROJECT_NAME }}",
            &values(&[("PROJECT_NAME", "shop")]),
        )
        .unwrap();
        assert_eq!(out, "container_name: shop_app # shop");
    }

    #[test]
    fn reports_every_missing_token_once() {
        let err = substitute("{{B}} {{A}} {{B}}", &values(&[])).unwrap_err();
        assert_eq!(err, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn runtime_tokens_are_untouched() {
        let text = "ports:\n  - \"${DB_PORT:-5432}:5432\"\nuser: ${UID}";
        assert_eq!(substitute(text, &values(&[("DB_PORT", "9999")])).unwrap(), text);
    }

    #[test]
    fn go_template_expressions_are_not_tokens() {
        let text = "test: [\"CMD\", \"docker\", \"inspect\", \"{{.State.Health}}\"]";
        assert_eq!(substitute(text, &values(&[])).unwrap(), text);
        assert!(build_time_tokens(text).is_empty());
    }

    #[test]
    fn unterminated_open_is_literal() {
        assert_eq!(substitute("a {{ b", &values(&[])).unwrap(), "a {{ b");
    }

    #[test]
    fn lists_build_time_tokens() {
        assert_eq!(
            build_time_tokens("{{A}}-{{B}}-{{A}}"),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn parses_runtime_token_forms() {
        assert_eq!(
            runtime_token("${DB_PORT:-5432}"),
            Some(RuntimeToken {
                name: "DB_PORT",
                default: Some("5432")
            })
        );
        assert_eq!(
            runtime_token("${DB_HOST-postgres}"),
            Some(RuntimeToken {
                name: "DB_HOST",
                default: Some("postgres")
            })
        );
        assert_eq!(
            runtime_token("${APP_KEY}"),
            Some(RuntimeToken {
                name: "APP_KEY",
                default: None
            })
        );
        assert_eq!(
            runtime_token("${EMPTY:-}"),
            Some(RuntimeToken {
                name: "EMPTY",
                default: Some("")
            })
        );
    }

    #[test]
    fn partial_values_are_not_runtime_tokens() {
        assert!(runtime_token("http://${HOST}:80").is_none());
        assert!(runtime_token("${A}${B}").is_none());
        assert!(runtime_token("${1BAD:-x}").is_none());
        assert!(runtime_token("plain").is_none());
    }

    #[test]
    fn variable_names() {
        assert!(is_variable_name("DB_PORT"));
        assert!(is_variable_name("_private1"));
        assert!(!is_variable_name("1ST"));
        assert!(!is_variable_name("app.name"));
        assert!(!is_variable_name(""));
    }
}
