use devstack::error::{CompatibilityError, StateError};
use devstack::DevstackError;

/// Render an error for the terminal, with a hint when one applies.
pub fn format_error(err: &anyhow::Error) -> String {
    let Some(devstack) = err.downcast_ref::<DevstackError>() else {
        return format!("[ERROR] {}\n", err);
    };

    let mut out = match (devstack, devstack.engine_stderr()) {
        (DevstackError::Engine { project, action, .. }, Some(stderr)) if !stderr.trim().is_empty() => {
            let mut out = format!("[ERROR] {} failed for project '{}'\n\nEngine output:\n", action, project);
            for line in stderr.trim().lines() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
            out
        }
        _ => format!("[ERROR] {}\n", err),
    };

    if let Some(hint) = hint(devstack) {
        out.push_str(&format!("\nFIX: {}\n", hint));
    }
    out
}

fn hint(err: &DevstackError) -> Option<&'static str> {
    match err {
        DevstackError::State(StateError::Busy { .. }) => Some(
            "Wait for the other command to finish. If it was interrupted, run `devstack reset`.",
        ),
        DevstackError::State(StateError::AlreadyInitialized { .. }) => {
            Some("Re-run with --force to regenerate the files.")
        }
        DevstackError::State(StateError::NotInitialized { .. }) => {
            Some("Run `devstack init <path> --stack <id>` first, or pass the project directory.")
        }
        DevstackError::State(StateError::IllegalTransition { .. }) => {
            Some("Check `devstack status`; a project in ERROR can be started again.")
        }
        DevstackError::Compatibility(CompatibilityError::IncompatibleService { .. }) => {
            Some("List usable services with `devstack services --framework <framework>`.")
        }
        DevstackError::Compatibility(CompatibilityError::NotAFrameworkProject { .. }) => {
            Some("Drop --existing to create a fresh project, or point at the framework's root.")
        }
        DevstackError::ComposeFileNotFound { .. } => {
            Some("Regenerate the files with `devstack init <path> --stack <id> --existing --force`.")
        }
        _ => None,
    }
}

pub fn print_error(err: &anyhow::Error, json: bool) {
    if json {
        let mut output = serde_json::json!({
            "type": "error",
            "message": err.to_string(),
        });
        if let Some(stderr) = err
            .downcast_ref::<DevstackError>()
            .and_then(DevstackError::engine_stderr)
        {
            output["engine_stderr"] = serde_json::Value::String(stderr.to_string());
        }
        let _ = crate::ui::json::emit(output);
        return;
    }

    eprint!("{}", format_error(err));
}
