use std::collections::BTreeMap;

use devstack::domain::services::placeholder::{build_time_tokens, runtime_token, substitute};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,12}"
}

proptest! {
    #[test]
    fn runtime_tokens_survive_substitution(
        var in name(),
        default in "[a-z0-9]{0,8}",
        value in "[a-z]{1,8}",
    ) {
        let runtime = format!("${{{var}:-{default}}}");
        let text = format!("port: \"{runtime}\"\nname: {{{{PROJECT_NAME}}}}\n");
        let values = BTreeMap::from([("PROJECT_NAME".to_string(), value.clone())]);

        let out = substitute(&text, &values).unwrap();
        let substituted = format!("name: {}", value);
        prop_assert!(out.contains(&runtime));
        prop_assert!(out.contains(&substituted));
        let token = runtime_token(&runtime).unwrap();
        prop_assert_eq!(token.name, var.as_str());
        prop_assert_eq!(token.default, Some(default.as_str()));
    }

    #[test]
    fn every_unresolved_token_is_reported(names in proptest::collection::btree_set(name(), 1..6)) {
        let text: String = names.iter().map(|n| format!("{{{{ {n} }}}} ")).collect();
        let missing = substitute(&text, &BTreeMap::new()).unwrap_err();
        prop_assert_eq!(missing, names.iter().cloned().collect::<Vec<_>>());
        prop_assert_eq!(build_time_tokens(&text).len(), names.len());
    }

    #[test]
    fn substitution_never_panics(text in "\\PC{0,80}") {
        let _ = substitute(&text, &BTreeMap::new());
        let _ = build_time_tokens(&text);
        let _ = runtime_token(&text);
    }
}
