//! File System Implementations
//!
//! Concrete implementations of the FileSystem port.

mod home;
mod local;

pub use home::{devstack_home_dir, devstack_user_dir, DEVSTACK_HOME_VAR, USER_DIR};
pub use local::{atomic_write, LocalFs};
