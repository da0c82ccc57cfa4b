//! Logs command handler
//!
//! Follow mode streams until the engine exits. Ctrl+C reaches the engine
//! too (same process group); the handler only makes sure devstack itself
//! exits quietly instead of being killed mid-line.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use devstack::presentation::factory::create_orchestrator;
use devstack::{Config, LogOptions};

use crate::commands::project_root::resolve_project_root;
use crate::ui::json;

pub fn cmd_logs(
    path: Option<&Path>,
    options: LogOptions,
    json: bool,
    config: &Config,
) -> Result<()> {
    let root = resolve_project_root(path)?;
    let orchestrator = create_orchestrator(config);

    let interrupted = Arc::new(AtomicBool::new(false));
    if options.follow {
        let flag = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            debug!(error = %e, "could not install interrupt handler");
        }
    }

    let mut on_line = |line: &str| {
        if json {
            let _ = json::emit(serde_json::json!({"type": "log", "line": line}));
        } else {
            println!("{}", line);
        }
    };

    match orchestrator.logs(&root, &options, &mut on_line) {
        Err(_) if interrupted.load(Ordering::SeqCst) => Ok(()),
        other => Ok(other?),
    }
}
