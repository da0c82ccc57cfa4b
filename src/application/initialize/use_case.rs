//! Initialize Use Case

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::entities::{
    ComposeDocument, LoadedTemplate, ProjectRecord, ProjectState, ProjectSummary, Registry,
    ServiceDescriptor, StackManifest, GENERATED_HEADER,
};
use crate::domain::ports::{FileSystem, ProjectStore, RegistryRepository};
use crate::domain::services::{
    compose_builder, env_generator, port_allocator, EnvSource, GenerationError, PortRequest,
};
use crate::domain::value_objects::{
    ContentHash, ProjectLayout, ProjectName, BASE_FILE, ENV_FILE,
};
use crate::error::{CompatibilityError, DevstackError, DevstackResult, StateError};
use crate::infrastructure::catalog::{ServiceRegistry, StackRegistry};

use super::options::{InitMode, InitOptions};
use super::result::InitResult;

/// Creates (or with `force`, regenerates) a project's devstack setup
pub struct ProjectInitializer<'a, FS, PS>
where
    FS: FileSystem,
    PS: ProjectStore,
{
    stacks: &'a StackRegistry,
    services: &'a ServiceRegistry,
    fs: FS,
    store: PS,
    registry: Arc<dyn RegistryRepository>,
}

/// A swapped-in `.devstack/` and, on regeneration, where the old one went
struct Installed {
    files: Vec<PathBuf>,
    backup: Option<PathBuf>,
}

/// Everything that gets written, computed before touching the disk
struct Generated {
    files: Vec<(String, String)>,
    ports: BTreeMap<String, u16>,
    warnings: Vec<String>,
}

impl<'a, FS, PS> ProjectInitializer<'a, FS, PS>
where
    FS: FileSystem,
    PS: ProjectStore,
{
    pub fn new(
        stacks: &'a StackRegistry,
        services: &'a ServiceRegistry,
        fs: FS,
        store: PS,
        registry: Arc<dyn RegistryRepository>,
    ) -> Self {
        Self {
            stacks,
            services,
            fs,
            store,
            registry,
        }
    }

    pub fn initialize(&self, target: &Path, options: &InitOptions) -> DevstackResult<InitResult> {
        let stack = self.stacks.get(&options.stack)?;
        let services = self.resolve_services(stack, &options.services)?;
        let layout = ProjectLayout::new(target);

        self.check_target(&layout, stack, options)?;
        if options.mode == InitMode::Fresh {
            self.fs.create_dir_all(target)?;
        }
        let _lock = self.lock(target)?;
        let previous = self.previous_record(target)?;

        let mut warnings = Vec::new();
        let registry = self.registry.load().unwrap_or_else(|e| {
            warn!(error = %e, "global registry unreadable; continuing without it");
            warnings.push(format!("global registry unreadable: {}", e));
            Registry::new()
        });
        let name = self.choose_name(target, options, previous.as_ref(), &registry)?;

        let generated = self.generate(&name, target, stack, &services, options, &registry)?;
        warnings.extend(generated.warnings);

        let mut record = ProjectRecord::new(name.clone(), target.to_path_buf(), &stack.id)
            .with_services(services.iter().map(|s| s.id.clone()).collect())
            .with_environment(options.environment)
            .with_state(ProjectState::Ready);
        record.ports = generated.ports;
        record.generated = generated
            .files
            .iter()
            .map(|(file, content)| (file.clone(), ContentHash::from_content(content)))
            .collect();
        if let Some(previous) = &previous {
            record.created_at = previous.created_at;
        }

        let installed = self.install(&layout, &generated.files)?;
        if let Err(e) = self.store.save(target, &record) {
            self.roll_back(&layout, installed.backup.as_deref());
            return Err(e.into());
        }
        if let Some(backup) = &installed.backup {
            if let Err(e) = self.fs.remove_dir_all(backup) {
                warn!(path = %backup.display(), error = %e, "could not remove previous setup");
            }
        }

        if let Err(e) = self
            .registry
            .register(name.as_str(), ProjectSummary::from_record(&record))
        {
            warn!(project = %name, error = %e, "failed to update global registry");
            warnings.push(format!("global registry not updated: {}", e));
        }

        info!(
            project = %name,
            stack = %stack.id,
            services = record.services.len(),
            "project initialized"
        );

        Ok(InitResult {
            record,
            files: installed.files,
            warnings,
        })
    }

    fn resolve_services(
        &self,
        stack: &StackManifest,
        ids: &[String],
    ) -> DevstackResult<Vec<&'a ServiceDescriptor>> {
        let mut resolved: Vec<&'a ServiceDescriptor> = Vec::with_capacity(ids.len());
        for id in ids {
            if resolved.iter().any(|s| s.id == *id) {
                debug!(service = %id, "ignoring repeated service selection");
                continue;
            }
            let service = self.services.get(id)?;
            if !service.is_compatible_with(&stack.framework) {
                return Err(CompatibilityError::IncompatibleService {
                    service: service.id.clone(),
                    stack: stack.id.clone(),
                    framework: stack.framework.clone(),
                }
                .into());
            }
            resolved.push(service);
        }
        Ok(resolved)
    }

    /// Enforce the mode's preconditions.
    fn check_target(
        &self,
        layout: &ProjectLayout,
        stack: &StackManifest,
        options: &InitOptions,
    ) -> DevstackResult<()> {
        let root = layout.root();
        let has_markers = stack
            .markers
            .iter()
            .any(|marker| self.fs.exists(&root.join(marker)));
        let has_devstack = self.fs.exists(&layout.record_file())
            || self.fs.exists(&layout.base_file())
            || self.fs.exists(&layout.legacy_base_file());

        if has_devstack && !options.force {
            return Err(StateError::AlreadyInitialized {
                path: root.to_path_buf(),
            }
            .into());
        }

        match options.mode {
            InitMode::Fresh if has_markers && !options.force => Err(StateError::AlreadyInitialized {
                path: root.to_path_buf(),
            }
            .into()),
            InitMode::Existing
                if !self.fs.exists(root) || (!stack.markers.is_empty() && !has_markers) =>
            {
                Err(CompatibilityError::NotAFrameworkProject {
                    path: root.to_path_buf(),
                    framework: stack.framework.clone(),
                    markers: stack.markers.clone(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    /// Hold the project's lifecycle lock while its setup is replaced.
    fn lock(&self, target: &Path) -> DevstackResult<PS::Lock> {
        if let Some(lock) = self.store.try_lock(target)? {
            return Ok(lock);
        }
        let (project, state) = match self.store.load(target) {
            Ok(Some(record)) => (record.name.to_string(), record.state),
            _ => (
                ProjectName::from_dir(target).to_string(),
                ProjectState::Uninitialized,
            ),
        };
        Err(StateError::Busy { project, state }.into())
    }

    /// The record being replaced. A project mid-transition is refused.
    fn previous_record(&self, target: &Path) -> DevstackResult<Option<ProjectRecord>> {
        let previous = match self.store.load(target) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "replacing unreadable project record");
                None
            }
        };
        if let Some(record) = &previous {
            if record.state.is_transient() {
                return Err(StateError::Busy {
                    project: record.name.to_string(),
                    state: record.state,
                }
                .into());
            }
        }
        Ok(previous)
    }

    fn choose_name(
        &self,
        target: &Path,
        options: &InitOptions,
        previous: Option<&ProjectRecord>,
        registry: &Registry,
    ) -> DevstackResult<ProjectName> {
        if let Some(raw) = &options.name {
            return ProjectName::parse(raw).map_err(DevstackError::InvalidInput);
        }
        if let Some(previous) = previous {
            return Ok(previous.name.clone());
        }

        let base = ProjectName::from_dir(target);
        let taken = |name: &ProjectName| {
            registry
                .get(name.as_str())
                .and_then(|entry| entry.path.as_deref())
                .is_some_and(|path| path != target)
        };

        let mut name = base.clone();
        let mut n = 2;
        while taken(&name) {
            name = ProjectName::slugify(&format!("{}-{}", base, n));
            n += 1;
        }
        if name != base {
            debug!(wanted = %base, chosen = %name, "project name already registered elsewhere");
        }
        Ok(name)
    }

    fn generate(
        &self,
        name: &ProjectName,
        target: &Path,
        stack: &StackManifest,
        services: &[&ServiceDescriptor],
        options: &InitOptions,
        registry: &Registry,
    ) -> DevstackResult<Generated> {
        let ports = allocate_ports(name, services, options, registry)?;

        let mut overrides: BTreeMap<String, String> = ports
            .iter()
            .map(|(variable, port)| (variable.clone(), port.to_string()))
            .collect();
        overrides.extend(options.variables.clone());

        let mut values = overrides.clone();
        values.insert("PROJECT_NAME".to_string(), name.to_string());
        values.insert("PROJECT_PATH".to_string(), target.display().to_string());
        values.insert("STACK".to_string(), stack.id.clone());
        values.insert("FRAMEWORK".to_string(), stack.framework.clone());

        let mut templates: Vec<LoadedTemplate> = Vec::with_capacity(services.len() + 1);
        templates.push(self.stacks.load_template(stack)?);
        for service in services {
            templates.push(self.services.load_template(service)?);
        }

        let mut files = Vec::new();
        for environment in options.environments() {
            let composed = compose_builder::build(&templates, environment, &values)?;
            if files.is_empty() {
                files.push((BASE_FILE.to_string(), render(BASE_FILE, &composed.base)?));
            }
            let overlay = environment.overlay_file_name();
            let content = render(&overlay, &composed.overlay)?;
            files.push((overlay, content));
        }

        let mut sources = vec![EnvSource::new(&templates[0]).with_secrets(&stack.secret_variables)];
        for (template, service) in templates[1..].iter().zip(services) {
            sources.push(
                EnvSource::new(template)
                    .with_defaults(&service.default_variables)
                    .with_required(&service.required_variables)
                    .with_secrets(&service.secret_variables),
            );
        }
        let env = env_generator::generate(&sources, &values, &overrides)?;
        for warning in &env.warnings {
            warn!(project = %name, "{}", warning);
        }
        files.push((
            ENV_FILE.to_string(),
            format!("{}{}", GENERATED_HEADER, env.file.render()),
        ));

        Ok(Generated {
            files,
            ports,
            warnings: env.warnings.iter().map(ToString::to_string).collect(),
        })
    }

    /// Write `files` into a staging directory, then swap it in as `.devstack/`.
    /// The previous directory is kept aside until the caller commits.
    fn install(
        &self,
        layout: &ProjectLayout,
        files: &[(String, String)],
    ) -> DevstackResult<Installed> {
        let root = layout.root();
        let private = layout.private_dir();
        let staging = root.join(format!(".devstack.staging-{}", uuid::Uuid::new_v4().simple()));

        let staged = files.iter().try_for_each(|(file, content)| {
            let path = staging.join(file);
            debug!(path = %path.display(), "staging");
            self.fs.write(&path, content)
        });
        if let Err(e) = staged {
            let _ = self.fs.remove_dir_all(&staging);
            return Err(e.into());
        }

        let backup = if self.fs.exists(&private) {
            let backup = root.join(format!(".devstack.old-{}", uuid::Uuid::new_v4().simple()));
            if let Err(e) = self.fs.rename(&private, &backup) {
                let _ = self.fs.remove_dir_all(&staging);
                return Err(e.into());
            }
            Some(backup)
        } else {
            None
        };

        if let Err(e) = self.fs.rename(&staging, &private) {
            let _ = self.fs.remove_dir_all(&staging);
            if let Some(backup) = &backup {
                let _ = self.fs.rename(backup, &private);
            }
            return Err(e.into());
        }

        Ok(Installed {
            files: files.iter().map(|(file, _)| private.join(file)).collect(),
            backup,
        })
    }

    /// Drop the new `.devstack/` and put the previous one back.
    fn roll_back(&self, layout: &ProjectLayout, backup: Option<&Path>) {
        let private = layout.private_dir();
        if let Err(e) = self.fs.remove_dir_all(&private) {
            warn!(path = %private.display(), error = %e, "could not remove new setup");
        }
        if let Some(backup) = backup {
            if let Err(e) = self.fs.rename(backup, &private) {
                warn!(path = %backup.display(), error = %e, "could not restore previous setup");
            }
        }
    }
}

fn allocate_ports(
    name: &ProjectName,
    services: &[&ServiceDescriptor],
    options: &InitOptions,
    registry: &Registry,
) -> DevstackResult<BTreeMap<String, u16>> {
    let mut fixed = BTreeMap::new();
    let mut requests = Vec::new();

    for service in services {
        let (Some(variable), Some(preferred)) = (
            service.port_variable(),
            service.ports.as_ref().and_then(|p| p.external),
        ) else {
            continue;
        };
        match options.variables.get(&variable) {
            Some(raw) => {
                let port = raw.parse::<u16>().map_err(|_| {
                    DevstackError::InvalidInput(format!(
                        "{} must be a port number, got '{}'",
                        variable, raw
                    ))
                })?;
                fixed.insert(variable, port);
            }
            None => requests.push(PortRequest {
                service_id: service.id.clone(),
                variable,
                preferred,
            }),
        }
    }

    let mut in_use = registry.ports_in_use(Some(name.as_str()));
    in_use.extend(fixed.values().copied());
    let mut ports = port_allocator::allocate(&requests, &in_use, options.port_range.clone())?;
    ports.extend(fixed);
    Ok(ports)
}

fn render(file: &str, doc: &ComposeDocument) -> Result<String, GenerationError> {
    doc.to_yaml().map_err(|e| GenerationError::Render {
        file: file.to_string(),
        message: e.to_string(),
    })
}
