//! Stacks/services listing

use anyhow::Result;

use devstack::domain::entities::{ServiceDescriptor, StackManifest};
use devstack::infrastructure::catalog::{ServiceFilter, StackFilter};
use devstack::presentation::factory::load_catalogs;
use devstack::Config;

use crate::ui::json;
use crate::ui::table::Table;

pub fn cmd_stacks(json: bool, config: &Config) -> Result<()> {
    let catalogs = load_catalogs(&config.templates_dir())?;
    let stacks = catalogs.stacks.list(&StackFilter::default());

    if json {
        let items: Vec<_> = stacks.iter().map(|s| stack_json(s)).collect();
        json::emit(serde_json::json!({
            "type": "stacks",
            "count": items.len(),
            "stacks": items,
        }))?;
        return Ok(());
    }

    let mut table = Table::new(["ID", "FRAMEWORK", "RUNTIME", "DESCRIPTION"]);
    for stack in &stacks {
        table.row([
            stack.id.clone(),
            stack.framework.clone(),
            stack.runtime.clone(),
            stack.description.clone(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}

pub fn cmd_services(
    category: Option<String>,
    framework: Option<String>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let catalogs = load_catalogs(&config.templates_dir())?;
    let filter = ServiceFilter {
        category,
        framework,
    };
    let services = catalogs.services.list(&filter);

    if json {
        let items: Vec<_> = services.iter().map(|s| service_json(s)).collect();
        json::emit(serde_json::json!({
            "type": "services",
            "count": items.len(),
            "services": items,
        }))?;
        return Ok(());
    }

    if services.is_empty() {
        println!("No matching services.");
        return Ok(());
    }
    let mut table = Table::new(["ID", "PORT", "COMPATIBLE", "DESCRIPTION"]);
    for service in &services {
        table.row([
            service.id.clone(),
            service
                .ports
                .as_ref()
                .and_then(|p| p.external)
                .map(|p| p.to_string())
                .unwrap_or_default(),
            compatibility(service),
            service.description.clone(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}

fn compatibility(service: &ServiceDescriptor) -> String {
    if service.compatible_with.contains("*") {
        "any".to_string()
    } else {
        service
            .compatible_with
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn stack_json(stack: &StackManifest) -> serde_json::Value {
    serde_json::json!({
        "id": stack.id,
        "name": stack.name,
        "framework": stack.framework,
        "runtime": stack.runtime,
        "version": stack.version,
        "description": stack.description,
    })
}

fn service_json(service: &ServiceDescriptor) -> serde_json::Value {
    serde_json::json!({
        "id": service.id,
        "category": service.category,
        "name": service.name,
        "description": service.description,
        "compatible_with": service.compatible_with,
        "port": service.ports.as_ref().and_then(|p| p.external),
        "port_variable": service.port_variable(),
        "required_variables": service.required_variables,
        "optional_variables": service.optional_variables,
    })
}
