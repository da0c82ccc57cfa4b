//! Home directory resolution with test isolation support.
//!
//! On Windows, `dirs::home_dir()` uses the Windows system API rather than
//! environment variables, so setting `HOME` in tests has no effect there.
//! `devstack_home_dir()` checks `DEVSTACK_HOME` first and falls back to
//! `dirs::home_dir()`.
//!
//! Everything devstack keeps per user (global registry, config, user
//! templates) lives under `<home>/.devstack/`.

use std::path::PathBuf;

/// Environment variable overriding the home directory.
pub const DEVSTACK_HOME_VAR: &str = "DEVSTACK_HOME";

/// Per-user directory name under the home directory.
pub const USER_DIR: &str = ".devstack";

/// Get the home directory for devstack-internal paths.
///
/// # Returns
///
/// - `Some(PathBuf)` - The home directory path
/// - `None` - If neither `DEVSTACK_HOME` is set nor system home can be resolved
pub fn devstack_home_dir() -> Option<PathBuf> {
    std::env::var(DEVSTACK_HOME_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// `<home>/.devstack`, or a relative `.devstack` when no home is known.
pub fn devstack_user_dir() -> PathBuf {
    devstack_home_dir()
        .map(|h| h.join(USER_DIR))
        .unwrap_or_else(|| PathBuf::from(USER_DIR))
}
