//! Environment value object - selects which overlay sections are merged
//!
//! - `Dev` merges the `dev` sections into `docker-compose.dev.yml`
//! - `Prod` merges the `prod` sections into `docker-compose.prod.yml`

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target environment of a generated overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Dev, Environment::Prod];

    /// Template section holding this environment's overlay patches
    pub fn section(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    /// File name of the overlay document for this environment
    pub fn overlay_file_name(&self) -> String {
        format!("docker-compose.{}.yml", self.section())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.section())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!("unknown environment '{}' (expected dev or prod)", other)),
        }
    }
}
