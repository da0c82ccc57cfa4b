//! Property tests for devstack.
//!
//! Run with: `cargo test --test properties`

#[path = "properties/placeholder.rs"]
mod placeholder;

#[path = "properties/port_allocation.rs"]
mod port_allocation;
