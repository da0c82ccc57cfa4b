//! Projects command handler
//!
//! Lists projects in the global registry (`Config::registry_path`).

use anyhow::Result;

use devstack::application::RegisteredProject;
use devstack::presentation::factory::create_registry_use_case;
use devstack::Config;

use crate::ui::json;
use crate::ui::table::Table;

pub fn cmd_projects(
    prune: bool,
    forget: Option<String>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let registry = create_registry_use_case(config);

    if let Some(name) = forget {
        let removed = registry.forget(&name)?;
        if json {
            json::emit(serde_json::json!({
                "type": "forget",
                "project": name,
                "removed": removed,
            }))?;
        } else if removed {
            println!("Removed '{}' from the registry", name);
        } else {
            println!("'{}' is not in the registry", name);
        }
        return Ok(());
    }

    let pruned = if prune { registry.prune()? } else { Vec::new() };
    let projects = registry.list_projects()?;

    if json {
        json::emit(serde_json::json!({
            "type": "projects",
            "count": projects.len(),
            "projects": projects,
            "pruned": pruned,
        }))?;
        return Ok(());
    }

    for name in &pruned {
        println!("Pruned '{}'", name);
    }
    if projects.is_empty() {
        println!("No projects in {}", config.registry_path().display());
        return Ok(());
    }
    print!("{}", projects_table(&projects).render());
    Ok(())
}

fn projects_table(projects: &[RegisteredProject]) -> Table {
    let mut table = Table::new(["NAME", "STATE", "STACK", "PATH"]);
    for project in projects {
        let summary = &project.summary;
        table.row([
            project.name.clone(),
            summary
                .state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            summary.stack.clone().unwrap_or_else(|| "-".to_string()),
            summary
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}
