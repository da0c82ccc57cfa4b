//! Registry Use Case
//!
//! Application-layer access to the global discovery index. Nothing here
//! touches a project's own record.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::{ProjectSummary, Registry};
use crate::domain::ports::{RegistryError, RegistryRepository};
use crate::domain::value_objects::ProjectLayout;

/// One registry entry with its name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredProject {
    pub name: String,
    #[serde(flatten)]
    pub summary: ProjectSummary,
}

pub struct RegistryUseCase {
    repository: Arc<dyn RegistryRepository>,
}

impl RegistryUseCase {
    pub fn new(repository: Arc<dyn RegistryRepository>) -> Self {
        Self { repository }
    }

    /// Every known project, sorted by name.
    pub fn list_projects(&self) -> Result<Vec<RegisteredProject>, RegistryError> {
        Ok(self
            .repository
            .load()?
            .all()
            .map(|(name, summary)| RegisteredProject {
                name: name.to_string(),
                summary: summary.clone(),
            })
            .collect())
    }

    /// Drop `name` from the index. Returns whether it was known.
    pub fn forget(&self, name: &str) -> Result<bool, RegistryError> {
        let mut removed = false;
        self.repository.update(&mut |registry: &mut Registry| {
            removed = registry.remove(name);
        })?;
        Ok(removed)
    }

    /// Drop entries whose directory no longer holds a project record.
    pub fn prune(&self) -> Result<Vec<String>, RegistryError> {
        let mut removed = Vec::new();
        self.repository.update(&mut |registry: &mut Registry| {
            removed = registry.prune(|summary| {
                summary.path.as_deref().is_some_and(has_record)
            });
        })?;
        Ok(removed)
    }
}

fn has_record(path: &Path) -> bool {
    ProjectLayout::new(path).record_file().is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct InMemoryRegistryRepo {
        registry: Mutex<Registry>,
    }

    impl InMemoryRegistryRepo {
        fn new() -> Self {
            Self {
                registry: Mutex::new(Registry::new()),
            }
        }
    }

    impl RegistryRepository for InMemoryRegistryRepo {
        fn load(&self) -> Result<Registry, RegistryError> {
            Ok(self.registry.lock().unwrap().clone())
        }

        fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
            *self.registry.lock().unwrap() = registry.clone();
            Ok(())
        }

        fn update(
            &self,
            change: &mut dyn FnMut(&mut Registry),
        ) -> Result<Registry, RegistryError> {
            let mut registry = self.registry.lock().unwrap();
            change(&mut registry);
            Ok(registry.clone())
        }
    }

    fn at(path: &Path) -> ProjectSummary {
        ProjectSummary {
            path: Some(path.to_path_buf()),
            ..ProjectSummary::default()
        }
    }

    #[test]
    fn test_list_is_sorted_by_name() {
        let repo = Arc::new(InMemoryRegistryRepo::new());
        repo.register("zeta", at(Path::new("/z"))).unwrap();
        repo.register("alpha", at(Path::new("/a"))).unwrap();
        let use_case = RegistryUseCase::new(repo);

        let names: Vec<String> = use_case
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_forget() {
        let repo = Arc::new(InMemoryRegistryRepo::new());
        repo.register("shop", at(Path::new("/srv/shop"))).unwrap();
        let use_case = RegistryUseCase::new(repo.clone());

        assert!(use_case.forget("shop").unwrap());
        assert!(!use_case.forget("shop").unwrap());
        assert!(repo.load().unwrap().projects.is_empty());
    }

    #[test]
    fn test_prune_removes_projects_without_record() {
        let live = tempdir().unwrap();
        std::fs::create_dir_all(live.path().join(".devstack")).unwrap();
        std::fs::write(live.path().join(".devstack/project.json"), "{}").unwrap();
        let gone = tempdir().unwrap();

        let repo = Arc::new(InMemoryRegistryRepo::new());
        repo.register("live", at(live.path())).unwrap();
        repo.register("gone", at(gone.path())).unwrap();
        repo.register("pathless", ProjectSummary::default()).unwrap();
        let use_case = RegistryUseCase::new(repo.clone());

        let mut removed = use_case.prune().unwrap();
        removed.sort();

        assert_eq!(removed, vec!["gone", "pathless"]);
        let remaining: Vec<String> = repo.load().unwrap().projects.into_keys().collect();
        assert_eq!(remaining, vec!["live"]);
    }

    #[test]
    fn test_entry_serializes_flat() {
        let project = RegisteredProject {
            name: "shop".to_string(),
            summary: at(Path::new("/srv/shop")),
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["name"], "shop");
        assert_eq!(json["path"], "/srv/shop");
    }
}
