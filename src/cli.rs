//! CLI Argument Parsing
//!
//! Global flags (--json, --verbose, --quiet, --config) are inherited by all
//! subcommands. Project commands default to the project enclosing the
//! current directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// devstack - container environments composed from framework and service templates
#[derive(Parser, Debug)]
#[command(name = "devstack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Machine-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (default: ~/.devstack/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a project's compose files, variables and record
    Init {
        /// Project directory (created unless --existing)
        path: PathBuf,

        /// Stack id, e.g. laravel
        #[arg(short, long)]
        stack: String,

        /// Service ids, e.g. databases.postgres (repeatable)
        #[arg(long = "service", value_name = "ID")]
        services: Vec<String>,

        /// Add devstack to an existing framework project
        #[arg(long)]
        existing: bool,

        /// Regenerate an already initialized project
        #[arg(short, long)]
        force: bool,

        /// Also generate the prod overlay
        #[arg(long)]
        prod: bool,

        /// Compose project name (default: directory name)
        #[arg(long)]
        name: Option<String>,

        /// Variable override KEY=VALUE (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        vars: Vec<(String, String)>,
    },

    /// Start the project's containers
    Start {
        path: Option<PathBuf>,
    },

    /// Stop and remove the project's containers
    Stop {
        path: Option<PathBuf>,
    },

    /// Restart the project, or one service of a running project
    Restart {
        path: Option<PathBuf>,

        #[arg(long)]
        service: Option<String>,
    },

    /// Show containers and their state
    Status {
        path: Option<PathBuf>,
    },

    /// Show container logs
    Logs {
        path: Option<PathBuf>,

        #[arg(long)]
        service: Option<String>,

        /// Keep streaming until interrupted
        #[arg(short, long)]
        follow: bool,

        /// Number of lines from the end of each log
        #[arg(long)]
        tail: Option<usize>,
    },

    /// Clear a STARTING/STOPPING state left by an interrupted command
    Reset {
        path: Option<PathBuf>,
    },

    /// List available stacks
    Stacks,

    /// List available services
    Services {
        #[arg(long)]
        category: Option<String>,

        /// Only services usable with this framework
        #[arg(long)]
        framework: Option<String>,
    },

    /// List projects in the global registry
    Projects {
        /// Drop entries whose directory no longer holds a project
        #[arg(long)]
        prune: bool,

        /// Remove one project from the registry (its files are untouched)
        #[arg(long, value_name = "NAME", conflicts_with = "prune")]
        forget: Option<String>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
