//! Start/stop/restart/reset command handlers

use std::path::Path;

use anyhow::Result;

use devstack::presentation::factory::create_orchestrator;
use devstack::{Config, LifecycleOutcome};

use crate::commands::project_root::resolve_project_root;
use crate::ui::json;

#[derive(Debug, Clone, Copy)]
pub enum LifecycleCommand<'a> {
    Start,
    Stop,
    Restart { service: Option<&'a str> },
}

pub fn cmd_lifecycle(
    path: Option<&Path>,
    command: LifecycleCommand<'_>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let root = resolve_project_root(path)?;
    let orchestrator = create_orchestrator(config);

    let outcome = match command {
        LifecycleCommand::Start => orchestrator.start(&root)?,
        LifecycleCommand::Stop => orchestrator.stop(&root)?,
        LifecycleCommand::Restart { service } => orchestrator.restart(&root, service)?,
    };
    let record = orchestrator.record(&root)?;

    if json {
        json::emit(serde_json::json!({
            "type": "lifecycle",
            "project": record.name.as_str(),
            "outcome": outcome,
            "changed": outcome.changed(),
            "state": record.state,
        }))?;
        return Ok(());
    }

    match (outcome, command) {
        (LifecycleOutcome::Restarted, LifecycleCommand::Restart { service: Some(service) }) => {
            println!("Restarted service '{}' of '{}'", service, record.name)
        }
        _ => println!("Project '{}' {} ({})", record.name, outcome, record.state),
    }
    Ok(())
}

pub fn cmd_reset(path: Option<&Path>, json: bool, config: &Config) -> Result<()> {
    let root = resolve_project_root(path)?;
    let orchestrator = create_orchestrator(config);
    let before = orchestrator.record(&root)?;
    let state = orchestrator.reset(&root)?;

    if json {
        json::emit(serde_json::json!({
            "type": "reset",
            "project": before.name.as_str(),
            "from": before.state,
            "state": state,
        }))?;
        return Ok(());
    }

    if before.state == state {
        println!("Project '{}' is {}; nothing to reset", before.name, state);
    } else {
        println!(
            "Project '{}' reset from {} to {}",
            before.name, before.state, state
        );
    }
    Ok(())
}
