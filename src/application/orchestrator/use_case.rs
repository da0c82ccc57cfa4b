//! Orchestrator Use Case

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::layout::{resolve_compose_files, ComposeFiles};
use crate::domain::entities::{
    LifecycleAction, ProjectRecord, ProjectState, ProjectSummary, TransitionDecision,
};
use crate::domain::ports::{
    CommandSpec, FileSystem, ProcessError, ProcessOutput, ProcessRunner, ProjectStore,
    RegistryRepository,
};
use crate::domain::value_objects::{ContentHash, ProjectLayout};
use crate::error::{DevstackError, DevstackResult, StateError};

use super::options::{EngineConfig, LogOptions};
use super::result::{parse_status, LifecycleOutcome, ServiceStatus};

const START_ARGS: [&str; 4] = ["up", "-d", "--remove-orphans", "--build"];
const STOP_ARGS: [&str; 2] = ["down", "--remove-orphans"];
const STATUS_ARGS: [&str; 4] = ["ps", "--all", "--format", "json"];

pub struct Orchestrator<PR, PS, FS>
where
    PR: ProcessRunner,
    PS: ProjectStore,
    FS: FileSystem,
{
    runner: PR,
    store: PS,
    fs: FS,
    registry: Arc<dyn RegistryRepository>,
    engine: EngineConfig,
}

impl<PR, PS, FS> Orchestrator<PR, PS, FS>
where
    PR: ProcessRunner,
    PS: ProjectStore,
    FS: FileSystem,
{
    pub fn new(
        runner: PR,
        store: PS,
        fs: FS,
        registry: Arc<dyn RegistryRepository>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            runner,
            store,
            fs,
            registry,
            engine,
        }
    }

    /// Current record of the project at `root`.
    pub fn record(&self, root: &Path) -> DevstackResult<ProjectRecord> {
        self.store
            .load(root)?
            .ok_or_else(|| {
                StateError::NotInitialized {
                    path: root.to_path_buf(),
                }
                .into()
            })
    }

    pub fn start(&self, root: &Path) -> DevstackResult<LifecycleOutcome> {
        self.transition(root, LifecycleAction::Start)
    }

    pub fn stop(&self, root: &Path) -> DevstackResult<LifecycleOutcome> {
        self.transition(root, LifecycleAction::Stop)
    }

    /// Restart the whole project, or a single service of a running one.
    pub fn restart(&self, root: &Path, service: Option<&str>) -> DevstackResult<LifecycleOutcome> {
        let Some(service) = service else {
            if self.record(root)?.state == ProjectState::Running {
                self.stop(root)?;
                self.start(root)?;
                return Ok(LifecycleOutcome::Restarted);
            }
            return self.start(root);
        };

        let _lock = self.lock(root)?;
        let mut record = self.record(root)?;
        if record.state != ProjectState::Running {
            return Err(self.refusal(&record, "restart"));
        }

        let files = self.compose_files(root, &record)?;
        let spec = self.command(&record, root, &files, ["restart", service])?;
        if let Err(e) = self.execute(&spec) {
            record.last_error = Some(failure_message(&e));
            self.save(root, &record)?;
            return Err(self.engine_error(&record, "restart", e));
        }

        info!(project = %record.name, service, "service restarted");
        Ok(LifecycleOutcome::Restarted)
    }

    /// Containers of the project as the engine reports them. No containers
    /// is an empty list.
    pub fn status(&self, root: &Path) -> DevstackResult<Vec<ServiceStatus>> {
        let record = self.record(root)?;
        let files = self.compose_files(root, &record)?;
        let spec = self.command(&record, root, &files, STATUS_ARGS)?;
        let output = self
            .execute(&spec)
            .map_err(|e| self.engine_error(&record, "status", e))?;
        Ok(parse_status(&output.stdout))
    }

    /// Stream engine log lines to `on_line`. Follow mode runs until the
    /// engine exits or the process is interrupted.
    pub fn logs(
        &self,
        root: &Path,
        options: &LogOptions,
        on_line: &mut dyn FnMut(&str),
    ) -> DevstackResult<()> {
        let record = self.record(root)?;
        let files = self.compose_files(root, &record)?;
        let timeout = if options.follow {
            None
        } else {
            self.engine.timeout
        };
        let subcommand = std::iter::once("logs".to_string()).chain(options.args());
        let spec = self.command(&record, root, &files, subcommand)?.timeout(timeout);

        self.runner
            .stream(&spec, on_line)
            .and_then(|output| output.into_checked(&spec.program))
            .map(|_| ())
            .map_err(|e| self.engine_error(&record, "logs", e))
    }

    /// Generated files whose content no longer matches the digest recorded
    /// at initialization. A missing or unreadable file counts as modified.
    pub fn modified_files(&self, root: &Path) -> DevstackResult<Vec<String>> {
        let record = self.record(root)?;
        let private = ProjectLayout::new(root).private_dir();

        let modified = record
            .generated
            .iter()
            .filter(|(file, recorded)| match self.fs.read(&private.join(file.as_str())) {
                Ok(content) => ContentHash::from_content(&content) != **recorded,
                Err(e) => {
                    debug!(file = %file, error = %e, "generated file unreadable");
                    true
                }
            })
            .map(|(file, _)| file.clone())
            .collect();
        Ok(modified)
    }

    /// Clear a `STARTING`/`STOPPING` left behind by an interrupted command.
    pub fn reset(&self, root: &Path) -> DevstackResult<ProjectState> {
        let _lock = self.lock(root)?;
        let mut record = self.record(root)?;
        if !record.state.is_transient() {
            debug!(project = %record.name, state = %record.state, "nothing to reset");
            return Ok(record.state);
        }

        let interrupted = record.state;
        record.fail_with(format!("interrupted while {}", interrupted));
        self.save(root, &record)?;
        self.mirror(&record);
        info!(project = %record.name, from = %interrupted, "stale lifecycle state reset");
        Ok(record.state)
    }

    fn transition(&self, root: &Path, action: LifecycleAction) -> DevstackResult<LifecycleOutcome> {
        let _lock = self.lock(root)?;
        let mut record = self.record(root)?;

        let transient = match record.state.decide(action) {
            TransitionDecision::Begin(state) => state,
            TransitionDecision::NoOp => {
                debug!(project = %record.name, state = %record.state, "nothing to do");
                return Ok(match action {
                    LifecycleAction::Start => LifecycleOutcome::AlreadyRunning,
                    LifecycleAction::Stop => LifecycleOutcome::AlreadyStopped,
                });
            }
            TransitionDecision::Busy => {
                return Err(StateError::Busy {
                    project: record.name.to_string(),
                    state: record.state,
                }
                .into());
            }
            TransitionDecision::Illegal => return Err(self.refusal(&record, action.verb())),
        };

        let files = self.compose_files(root, &record)?;
        let spec = match action {
            LifecycleAction::Start => self.command(&record, root, &files, START_ARGS)?,
            LifecycleAction::Stop => self.command(&record, root, &files, STOP_ARGS)?,
        };

        record.transition_to(transient);
        self.save(root, &record)?;
        self.mirror(&record);
        info!(project = %record.name, state = %record.state, "lifecycle transition");

        let result = self.execute(&spec);
        match &result {
            Ok(_) => record.transition_to(transient.settle(true).unwrap_or(ProjectState::Error)),
            Err(e) => record.fail_with(failure_message(e)),
        }
        self.save(root, &record)?;
        self.mirror(&record);
        info!(project = %record.name, state = %record.state, "lifecycle transition");

        result.map_err(|e| self.engine_error(&record, action.verb(), e))?;
        Ok(match action {
            LifecycleAction::Start => LifecycleOutcome::Started,
            LifecycleAction::Stop => LifecycleOutcome::Stopped,
        })
    }

    /// Take the lifecycle lock of an initialized project.
    fn lock(&self, root: &Path) -> DevstackResult<PS::Lock> {
        let record = self.record(root)?;
        if let Some(lock) = self.store.try_lock(root)? {
            return Ok(lock);
        }
        Err(StateError::Busy {
            project: record.name.to_string(),
            state: record.state,
        }
        .into())
    }

    fn compose_files(&self, root: &Path, record: &ProjectRecord) -> DevstackResult<ComposeFiles> {
        resolve_compose_files(&self.fs, &ProjectLayout::new(root), record.environment)
    }

    fn command<I, S>(
        &self,
        record: &ProjectRecord,
        root: &Path,
        files: &ComposeFiles,
        subcommand: I,
    ) -> DevstackResult<CommandSpec>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (program, leading) = self
            .engine
            .command
            .split_first()
            .ok_or_else(|| DevstackError::InvalidInput("engine command is empty".to_string()))?;

        Ok(CommandSpec::new(program)
            .args(leading.iter().cloned())
            .arg("-p")
            .arg(record.name.as_str())
            .args(files.file_args())
            .args(subcommand)
            .cwd(root)
            .timeout(self.engine.timeout))
    }

    fn execute(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        self.runner.run(spec)?.into_checked(&spec.program)
    }

    fn engine_error(
        &self,
        record: &ProjectRecord,
        action: &'static str,
        source: ProcessError,
    ) -> DevstackError {
        DevstackError::Engine {
            project: record.name.to_string(),
            action,
            source,
        }
    }

    fn refusal(&self, record: &ProjectRecord, action: &'static str) -> DevstackError {
        StateError::IllegalTransition {
            project: record.name.to_string(),
            state: record.state,
            action,
        }
        .into()
    }

    fn save(&self, root: &Path, record: &ProjectRecord) -> DevstackResult<()> {
        Ok(self.store.save(root, record)?)
    }

    /// Best effort; the project's own record is authoritative.
    fn mirror(&self, record: &ProjectRecord) {
        if let Err(e) = self
            .registry
            .register(record.name.as_str(), ProjectSummary::from_record(record))
        {
            warn!(project = %record.name, error = %e, "failed to update global registry");
        }
    }
}

fn failure_message(e: &ProcessError) -> String {
    match e {
        ProcessError::NonZeroExit { stderr, .. } if !stderr.is_empty() => stderr.clone(),
        other => other.to_string(),
    }
}
