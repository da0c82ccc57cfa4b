use std::path::{Path, PathBuf};

use devstack::domain::value_objects::ProjectLayout;

/// Nearest directory at or above `start` holding a devstack project record.
pub(crate) fn discover_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ProjectLayout::new(*dir).record_file().is_file())
        .map(Path::to_path_buf)
}

/// Project directory a lifecycle command operates on.
///
/// An explicit path is used as given (made absolute). Without one the
/// project enclosing the current directory is used, falling back to the
/// current directory itself so the error names where we looked.
pub(crate) fn resolve_project_root(explicit: Option<&Path>) -> std::io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => discover_project_root(&cwd).unwrap_or(cwd),
    })
}
