//! Terminal and `--json` rendering for the CLI

pub mod error;
pub mod json;
pub mod table;
