//! Status command handler

use std::path::Path;

use anyhow::Result;

use devstack::presentation::factory::create_orchestrator;
use devstack::Config;

use crate::commands::project_root::resolve_project_root;
use crate::ui::json;
use crate::ui::table::Table;

pub fn cmd_status(path: Option<&Path>, json: bool, config: &Config) -> Result<()> {
    let root = resolve_project_root(path)?;
    let orchestrator = create_orchestrator(config);
    let record = orchestrator.record(&root)?;
    let services = orchestrator.status(&root)?;
    let modified = orchestrator.modified_files(&root)?;

    if json {
        json::emit(serde_json::json!({
            "type": "status",
            "project": record.name.as_str(),
            "state": record.state,
            "last_error": record.last_error,
            "modified": modified,
            "services": services,
        }))?;
        return Ok(());
    }

    println!("Project '{}' ({}): {}", record.name, record.stack, record.state);
    if let Some(error) = &record.last_error {
        println!("Last error: {}", error.lines().next().unwrap_or_default());
    }
    if !modified.is_empty() {
        println!("Modified since init: {}", modified.join(", "));
    }
    if services.is_empty() {
        println!("No containers.");
        return Ok(());
    }

    let mut table = Table::new(["SERVICE", "STATE", "STATUS", "PORTS"]);
    for service in &services {
        table.row([
            service.service.clone(),
            service.state.clone(),
            service.status.clone(),
            service.published_ports().join(", "),
        ]);
    }
    print!("\n{}", table.render());
    Ok(())
}
