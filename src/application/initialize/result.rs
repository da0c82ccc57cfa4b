//! Initialization result

use std::path::PathBuf;

use crate::domain::entities::ProjectRecord;

#[derive(Debug, Clone)]
pub struct InitResult {
    pub record: ProjectRecord,
    /// Files written into the private directory
    pub files: Vec<PathBuf>,
    /// Non-fatal issues: variable collisions, registry mirroring failures
    pub warnings: Vec<String>,
}

impl InitResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
