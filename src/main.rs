//! devstack CLI - container environments from framework and service templates
//!
//! Usage: devstack <COMMAND>
//!
//! Commands:
//!   init      Generate compose files, variables and the project record
//!   start     Start the project's containers
//!   stop      Stop and remove them
//!   restart   Restart the project or one service
//!   status    Show containers
//!   logs      Show or follow container logs
//!   reset     Clear a state left by an interrupted command
//!   stacks    List stacks
//!   services  List services
//!   projects  List, prune or forget registered projects

mod cli;
mod commands;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use is_terminal::IsTerminal;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devstack::{Config, LogOptions};

use cli::{Cli, Commands};
use commands::init::InitArgs;
use commands::lifecycle::LifecycleCommand;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    let loaded = Config::load_or_default(cli.config.as_deref());
    let log_level = loaded
        .as_ref()
        .ok()
        .and_then(|(config, _)| config.log_level.clone());
    init_tracing(filter_directive(cli.verbose, cli.quiet, log_level.as_deref()));

    let result = loaded.map_err(anyhow::Error::from).and_then(|(config, warnings)| {
        for warning in &warnings {
            warn!("{}", warning);
        }
        run(cli, &config)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error::print_error(&e, json);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Init {
            path,
            stack,
            services,
            existing,
            force,
            prod,
            name,
            vars,
        } => commands::init::cmd_init(
            InitArgs {
                path,
                stack,
                services,
                existing,
                force,
                prod,
                name,
                vars,
            },
            json,
            config,
        ),
        Commands::Start { path } => {
            commands::lifecycle::cmd_lifecycle(path.as_deref(), LifecycleCommand::Start, json, config)
        }
        Commands::Stop { path } => {
            commands::lifecycle::cmd_lifecycle(path.as_deref(), LifecycleCommand::Stop, json, config)
        }
        Commands::Restart { path, service } => commands::lifecycle::cmd_lifecycle(
            path.as_deref(),
            LifecycleCommand::Restart {
                service: service.as_deref(),
            },
            json,
            config,
        ),
        Commands::Status { path } => commands::status::cmd_status(path.as_deref(), json, config),
        Commands::Logs {
            path,
            service,
            follow,
            tail,
        } => commands::logs::cmd_logs(
            path.as_deref(),
            LogOptions::new()
                .with_service(service)
                .with_follow(follow)
                .with_tail(tail),
            json,
            config,
        ),
        Commands::Reset { path } => commands::lifecycle::cmd_reset(path.as_deref(), json, config),
        Commands::Stacks => commands::catalog::cmd_stacks(json, config),
        Commands::Services {
            category,
            framework,
        } => commands::catalog::cmd_services(category, framework, json, config),
        Commands::Projects { prune, forget } => {
            commands::projects::cmd_projects(prune, forget, json, config)
        }
    }
}

/// `-q`/`-v` win over the configured level (which already includes `DEVSTACK_LOG`).
fn filter_directive(verbose: u8, quiet: bool, configured: Option<&str>) -> String {
    if quiet {
        return "error".to_string();
    }
    match (verbose, configured) {
        (0, Some(level)) => level.to_string(),
        (0, None) => "warn".to_string(),
        (1, _) => "info".to_string(),
        (2, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Logs go to stderr so stdout stays clean for `--json` output.
fn init_tracing(directive: String) {
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}
