//! Subprocess execution
//!
//! Concrete implementation of the ProcessRunner port.

mod system;

pub use system::SystemProcessRunner;
