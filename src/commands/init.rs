//! Init command handler

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use devstack::application::{InitMode, InitOptions, InitResult};
use devstack::presentation::factory::{create_initializer, load_catalogs, Catalogs};
use devstack::Config;

use crate::ui::json;

/// Parsed `devstack init` arguments
#[derive(Debug, Clone)]
pub struct InitArgs {
    pub path: PathBuf,
    pub stack: String,
    pub services: Vec<String>,
    pub existing: bool,
    pub force: bool,
    pub prod: bool,
    pub name: Option<String>,
    pub vars: Vec<(String, String)>,
}

impl InitArgs {
    fn into_options(self, config: &Config) -> InitOptions {
        let mode = if self.existing {
            InitMode::Existing
        } else {
            InitMode::Fresh
        };
        let variables: BTreeMap<String, String> = self.vars.into_iter().collect();

        InitOptions::new(self.stack)
            .with_services(self.services)
            .with_mode(mode)
            .with_force(self.force)
            .with_environment(config.defaults.environment)
            .with_prod(self.prod)
            .with_name(self.name)
            .with_variables(variables)
            .with_port_range(config.port_range())
    }
}

pub fn cmd_init(args: InitArgs, json: bool, config: &Config) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let target = if args.path.is_absolute() {
        args.path.clone()
    } else {
        cwd.join(&args.path)
    };

    let catalogs = load_catalogs(&config.templates_dir())?;
    report_skipped(&catalogs);

    let options = args.into_options(config);
    let result = create_initializer(&catalogs, config).initialize(&target, &options)?;

    if json {
        json::emit(init_event(&result))?;
        return Ok(());
    }

    let record = &result.record;
    println!(
        "Initialized '{}' ({}) at {}",
        record.name,
        record.stack,
        record.path.display()
    );
    if !record.services.is_empty() {
        println!("Services: {}", record.services.join(", "));
    }
    for (variable, port) in &record.ports {
        println!("  {} = {}", variable, port);
    }
    for file in &result.files {
        println!("  wrote {}", file.display());
    }
    for warning in &result.warnings {
        eprintln!("[WARN] {}", warning);
    }
    println!("\nNext: devstack start {}", record.path.display());
    Ok(())
}

fn report_skipped(catalogs: &Catalogs) {
    for skipped in catalogs
        .stacks
        .skipped()
        .iter()
        .chain(catalogs.services.skipped())
    {
        warn!(entry = %skipped.id, reason = %skipped.reason, "catalog entry skipped");
    }
}

fn init_event(result: &InitResult) -> serde_json::Value {
    serde_json::json!({
        "type": "init",
        "project": result.record.name.as_str(),
        "path": result.record.path,
        "stack": result.record.stack,
        "services": result.record.services,
        "environment": result.record.environment,
        "state": result.record.state,
        "ports": result.record.ports,
        "files": result.files,
        "warnings": result.warnings,
    })
}
