//! Global registry maintenance: listing, forgetting and pruning projects

mod use_case;

pub use use_case::{RegisteredProject, RegistryUseCase};
