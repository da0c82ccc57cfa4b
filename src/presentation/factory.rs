//! Use Case Factory
//!
//! Creates use cases with infrastructure dependencies wired up.
//! This is the dependency injection point for the application.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::{Orchestrator, ProjectInitializer, RegistryUseCase};
use crate::config::Config;
use crate::domain::ports::RegistryRepository;
use crate::error::DevstackResult;
use crate::infrastructure::catalog::{SERVICES_FILE, STACKS_FILE};
use crate::infrastructure::{
    JsonProjectStore, JsonRegistryRepository, LocalFs, ServiceRegistry, StackRegistry,
    SystemProcessRunner,
};

/// Type alias for the concrete Orchestrator with all dependencies
pub type ConcreteOrchestrator = Orchestrator<SystemProcessRunner, JsonProjectStore, LocalFs>;

/// Type alias for the concrete ProjectInitializer with all dependencies
pub type ConcreteInitializer<'a> = ProjectInitializer<'a, LocalFs, JsonProjectStore>;

/// Both catalogs of one template directory
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub dir: PathBuf,
    pub stacks: StackRegistry,
    pub services: ServiceRegistry,
}

/// Load `stacks.json` and `services.json` from `dir`.
pub fn load_catalogs(dir: &Path) -> DevstackResult<Catalogs> {
    Ok(Catalogs {
        dir: dir.to_path_buf(),
        stacks: StackRegistry::load(&dir.join(STACKS_FILE))?,
        services: ServiceRegistry::load(&dir.join(SERVICES_FILE))?,
    })
}

/// The global registry at the configured location
pub fn create_registry_repository(config: &Config) -> Arc<dyn RegistryRepository> {
    Arc::new(JsonRegistryRepository::with_path(config.registry_path()))
}

pub fn create_initializer<'a>(catalogs: &'a Catalogs, config: &Config) -> ConcreteInitializer<'a> {
    ProjectInitializer::new(
        &catalogs.stacks,
        &catalogs.services,
        LocalFs::new(),
        JsonProjectStore::new(),
        create_registry_repository(config),
    )
}

pub fn create_orchestrator(config: &Config) -> ConcreteOrchestrator {
    Orchestrator::new(
        SystemProcessRunner::new(),
        JsonProjectStore::new(),
        LocalFs::new(),
        create_registry_repository(config),
        config.engine_config(),
    )
}

pub fn create_registry_use_case(config: &Config) -> RegistryUseCase {
    RegistryUseCase::new(create_registry_repository(config))
}
