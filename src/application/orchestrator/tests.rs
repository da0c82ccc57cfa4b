use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::{tempdir, TempDir};

use super::*;
use crate::domain::entities::{ProjectRecord, ProjectState, Registry};
use crate::domain::ports::{
    CommandSpec, ProcessError, ProcessOutput, ProcessRunner, ProjectStore, RegistryError,
    RegistryRepository,
};
use crate::domain::value_objects::{ContentHash, Environment, ProjectLayout, ProjectName};
use crate::error::{DevstackError, StateError};
use crate::infrastructure::fs::LocalFs;
use crate::infrastructure::repositories::JsonProjectStore;

type Hook = Box<dyn Fn(&CommandSpec)>;

/// Records every command and answers from a script (success when empty).
#[derive(Default)]
struct MockRunner {
    calls: RefCell<Vec<CommandSpec>>,
    responses: RefCell<VecDeque<Result<ProcessOutput, ProcessError>>>,
    stream_lines: Vec<String>,
    hook: Option<Hook>,
}

impl MockRunner {
    fn respond(self, response: Result<ProcessOutput, ProcessError>) -> Self {
        self.responses.borrow_mut().push_back(response);
        self
    }

    fn next(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        self.calls.borrow_mut().push(spec.clone());
        if let Some(hook) = &self.hook {
            hook(spec);
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(output(0, "", "")))
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        self.next(spec)
    }

    fn stream(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ProcessOutput, ProcessError> {
        for line in &self.stream_lines {
            on_line(line);
        }
        self.next(spec)
    }
}

impl ProcessRunner for &MockRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        MockRunner::run(*self, spec)
    }

    fn stream(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ProcessOutput, ProcessError> {
        MockRunner::stream(*self, spec, on_line)
    }
}

#[derive(Default)]
struct MockRegistryRepository {
    registry: Mutex<Registry>,
    fail: bool,
}

impl RegistryRepository for MockRegistryRepository {
    fn load(&self) -> Result<Registry, RegistryError> {
        Ok(self.registry.lock().unwrap().clone())
    }

    fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        *self.registry.lock().unwrap() = registry.clone();
        Ok(())
    }

    fn update(&self, change: &mut dyn FnMut(&mut Registry)) -> Result<Registry, RegistryError> {
        if self.fail {
            return Err(RegistryError::AccessError {
                message: "disk full".to_string(),
            });
        }
        let mut registry = self.registry.lock().unwrap();
        change(&mut registry);
        Ok(registry.clone())
    }
}

fn output(code: i32, stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

struct Project {
    dir: TempDir,
    registry: Arc<MockRegistryRepository>,
}

impl Project {
    /// An initialized project named `shop` in `state`, with generated files.
    fn new(state: ProjectState) -> Self {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        std::fs::create_dir_all(layout.private_dir()).unwrap();
        std::fs::write(layout.base_file(), "services:\n  app:\n    image: nginx\n").unwrap();
        std::fs::write(layout.overlay_file(Environment::Dev), "services: {}\n").unwrap();
        std::fs::write(layout.env_file(), "APP_NAME=shop\n").unwrap();

        let project = Self {
            dir,
            registry: Arc::new(MockRegistryRepository::default()),
        };
        project.set_state(state);
        project
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(self.root())
    }

    fn set_state(&self, state: ProjectState) {
        let record = ProjectRecord::new(
            ProjectName::parse("shop").unwrap(),
            self.root().to_path_buf(),
            "laravel",
        )
        .with_state(state);
        JsonProjectStore::new().save(self.root(), &record).unwrap();
    }

    fn record(&self) -> ProjectRecord {
        JsonProjectStore::new().load(self.root()).unwrap().unwrap()
    }

    fn orchestrator<'r>(
        &self,
        runner: &'r MockRunner,
    ) -> Orchestrator<&'r MockRunner, JsonProjectStore, LocalFs> {
        Orchestrator::new(
            runner,
            JsonProjectStore::new(),
            LocalFs::new(),
            self.registry.clone(),
            EngineConfig::default(),
        )
    }

    fn registry_state(&self) -> Option<ProjectState> {
        self.registry
            .registry
            .lock()
            .unwrap()
            .get("shop")
            .and_then(|entry| entry.state)
    }
}

fn path_arg(path: PathBuf) -> String {
    path.display().to_string()
}

#[test]
fn test_start_ready_project() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();

    let outcome = project.orchestrator(&runner).start(project.root()).unwrap();

    assert_eq!(outcome, LifecycleOutcome::Started);
    assert_eq!(project.record().state, ProjectState::Running);
    assert_eq!(project.registry_state(), Some(ProjectState::Running));

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    let layout = project.layout();
    assert_eq!(calls[0].program, "docker");
    assert_eq!(
        calls[0].args,
        vec![
            "compose".to_string(),
            "-p".to_string(),
            "shop".to_string(),
            "-f".to_string(),
            path_arg(layout.base_file()),
            "-f".to_string(),
            path_arg(layout.overlay_file(Environment::Dev)),
            "--env-file".to_string(),
            path_arg(layout.env_file()),
            "up".to_string(),
            "-d".to_string(),
            "--remove-orphans".to_string(),
            "--build".to_string(),
        ]
    );
    assert_eq!(calls[0].cwd.as_deref(), Some(project.root()));
    assert_eq!(calls[0].timeout, Some(DEFAULT_ENGINE_TIMEOUT));
}

#[test]
fn test_state_is_starting_while_engine_runs() {
    let project = Project::new(ProjectState::Ready);
    let root = project.root().to_path_buf();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_hook = seen.clone();
    let runner = MockRunner {
        hook: Some(Box::new(move |_| {
            let state = JsonProjectStore::new().load(&root).unwrap().unwrap().state;
            *seen_in_hook.lock().unwrap() = Some(state);
        })),
        ..MockRunner::default()
    };

    project.orchestrator(&runner).start(project.root()).unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(ProjectState::Starting));
}

#[test]
fn test_concurrent_start_is_busy() {
    let project = Project::new(ProjectState::Ready);
    let root = project.root().to_path_buf();
    let registry = project.registry.clone();
    let second = Arc::new(Mutex::new(None));
    let second_in_hook = second.clone();
    let runner = MockRunner {
        hook: Some(Box::new(move |_| {
            let other = MockRunner::default();
            let result = Orchestrator::new(
                &other,
                JsonProjectStore::new(),
                LocalFs::new(),
                registry.clone(),
                EngineConfig::default(),
            )
            .start(&root);
            assert!(other.calls.borrow().is_empty());
            *second_in_hook.lock().unwrap() = Some(result);
        })),
        ..MockRunner::default()
    };

    let first = project.orchestrator(&runner).start(project.root());

    assert_eq!(first.unwrap(), LifecycleOutcome::Started);
    let second = second.lock().unwrap().take().unwrap();
    match second {
        Err(DevstackError::State(StateError::Busy { state, .. })) => {
            assert_eq!(state, ProjectState::Starting);
        }
        other => panic!("expected busy, got {other:?}"),
    }
}

#[test]
fn test_start_running_is_noop() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default();

    let outcome = project.orchestrator(&runner).start(project.root()).unwrap();

    assert_eq!(outcome, LifecycleOutcome::AlreadyRunning);
    assert!(!outcome.changed());
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_stale_transient_state_is_busy_until_reset() {
    let project = Project::new(ProjectState::Starting);
    let runner = MockRunner::default();
    let orchestrator = project.orchestrator(&runner);

    let err = orchestrator.start(project.root()).unwrap_err();
    assert!(matches!(err, DevstackError::State(StateError::Busy { .. })));

    assert_eq!(orchestrator.reset(project.root()).unwrap(), ProjectState::Error);
    let record = project.record();
    assert_eq!(record.last_error.as_deref(), Some("interrupted while STARTING"));

    assert_eq!(
        orchestrator.start(project.root()).unwrap(),
        LifecycleOutcome::Started
    );
    assert_eq!(project.record().state, ProjectState::Running);
    assert_eq!(project.record().last_error, None);
}

#[test]
fn test_reset_leaves_settled_state_alone() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default();

    let state = project.orchestrator(&runner).reset(project.root()).unwrap();

    assert_eq!(state, ProjectState::Running);
    assert_eq!(project.record().state, ProjectState::Running);
}

#[test]
fn test_failed_start_records_error() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default().respond(Ok(output(
        1,
        "",
        "Bind for 0.0.0.0:5432 failed: port is already allocated\n",
    )));

    let err = project.orchestrator(&runner).start(project.root()).unwrap_err();

    assert_eq!(
        err.engine_stderr(),
        Some("Bind for 0.0.0.0:5432 failed: port is already allocated")
    );
    let record = project.record();
    assert_eq!(record.state, ProjectState::Error);
    assert_eq!(
        record.last_error.as_deref(),
        Some("Bind for 0.0.0.0:5432 failed: port is already allocated")
    );
    assert_eq!(project.registry_state(), Some(ProjectState::Error));
}

#[test]
fn test_missing_engine_records_error() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default().respond(Err(ProcessError::NotFound {
        program: "docker".to_string(),
    }));

    let err = project.orchestrator(&runner).start(project.root()).unwrap_err();

    assert!(matches!(
        err,
        DevstackError::Engine {
            source: ProcessError::NotFound { .. },
            ..
        }
    ));
    assert_eq!(project.record().state, ProjectState::Error);
}

#[test]
fn test_stop_running_and_ready() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default();
    let orchestrator = project.orchestrator(&runner);

    assert_eq!(orchestrator.stop(project.root()).unwrap(), LifecycleOutcome::Stopped);
    assert_eq!(project.record().state, ProjectState::Ready);
    assert_eq!(
        orchestrator.stop(project.root()).unwrap(),
        LifecycleOutcome::AlreadyStopped
    );

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].args.ends_with(&["down".to_string(), "--remove-orphans".to_string()]));
}

#[test]
fn test_failed_stop_records_error() {
    let project = Project::new(ProjectState::Running);
    let root = project.root().to_path_buf();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_hook = seen.clone();
    let runner = MockRunner {
        hook: Some(Box::new(move |_| {
            let state = JsonProjectStore::new().load(&root).unwrap().unwrap().state;
            *seen_in_hook.lock().unwrap() = Some(state);
        })),
        ..MockRunner::default()
    }
    .respond(Err(ProcessError::Timeout {
        program: "docker".to_string(),
        after: Duration::from_secs(300),
    }));

    let err = project.orchestrator(&runner).stop(project.root()).unwrap_err();

    assert!(matches!(
        err,
        DevstackError::Engine {
            action: "stop",
            source: ProcessError::Timeout { .. },
            ..
        }
    ));
    assert_eq!(*seen.lock().unwrap(), Some(ProjectState::Stopping));
    let record = project.record();
    assert_eq!(record.state, ProjectState::Error);
    assert_eq!(
        record.last_error.as_deref(),
        Some("'docker' timed out after 300s")
    );
    assert_eq!(project.registry_state(), Some(ProjectState::Error));
}

#[test]
fn test_uninitialized_directory() {
    let dir = tempdir().unwrap();
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();

    let err = project.orchestrator(&runner).start(dir.path()).unwrap_err();

    assert!(matches!(
        err,
        DevstackError::State(StateError::NotInitialized { .. })
    ));
    assert!(!dir.path().join(".devstack").exists());
}

#[test]
fn test_missing_compose_file_keeps_state() {
    let project = Project::new(ProjectState::Ready);
    std::fs::remove_file(project.layout().base_file()).unwrap();
    let runner = MockRunner::default();

    let err = project.orchestrator(&runner).start(project.root()).unwrap_err();

    assert!(matches!(err, DevstackError::ComposeFileNotFound { .. }));
    assert_eq!(project.record().state, ProjectState::Ready);
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_status_with_no_containers() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();

    let statuses = project.orchestrator(&runner).status(project.root()).unwrap();

    assert!(statuses.is_empty());
    let calls = runner.calls.borrow();
    assert!(calls[0].args.ends_with(&[
        "ps".to_string(),
        "--all".to_string(),
        "--format".to_string(),
        "json".to_string()
    ]));
    assert_eq!(project.record().state, ProjectState::Ready);
}

#[test]
fn test_status_parses_containers() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default().respond(Ok(output(
        0,
        "{\"Service\":\"app\",\"State\":\"running\"}\n{\"Service\":\"redis\",\"State\":\"running\"}\n",
        "",
    )));

    let statuses = project.orchestrator(&runner).status(project.root()).unwrap();

    let services: Vec<_> = statuses.iter().map(|s| s.service.as_str()).collect();
    assert_eq!(services, vec!["app", "redis"]);
}

#[test]
fn test_modified_files_reports_hand_edits() {
    let project = Project::new(ProjectState::Ready);
    let layout = project.layout();
    let mut record = project.record();
    for (file, path) in [
        ("docker-compose.yml", layout.base_file()),
        ("docker-compose.dev.yml", layout.overlay_file(Environment::Dev)),
        (".env", layout.env_file()),
    ] {
        let content = std::fs::read_to_string(path).unwrap();
        record
            .generated
            .insert(file.to_string(), ContentHash::from_content(&content));
    }
    JsonProjectStore::new().save(project.root(), &record).unwrap();
    let runner = MockRunner::default();
    let orchestrator = project.orchestrator(&runner);

    assert!(orchestrator.modified_files(project.root()).unwrap().is_empty());

    std::fs::write(layout.env_file(), "APP_NAME=shop\nDEBUG=true\n").unwrap();
    std::fs::remove_file(layout.overlay_file(Environment::Dev)).unwrap();

    assert_eq!(
        orchestrator.modified_files(project.root()).unwrap(),
        vec![".env".to_string(), "docker-compose.dev.yml".to_string()]
    );
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn test_modified_files_without_digests() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default();

    let modified = project.orchestrator(&runner).modified_files(project.root()).unwrap();

    assert!(modified.is_empty());
}

#[test]
fn test_restart_running_project() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default();

    let outcome = project.orchestrator(&runner).restart(project.root(), None).unwrap();

    assert_eq!(outcome, LifecycleOutcome::Restarted);
    let calls = runner.calls.borrow();
    let subcommands: Vec<_> = calls.iter().map(|c| c.args[9].as_str()).collect();
    assert_eq!(subcommands, vec!["down", "up"]);
    assert_eq!(project.record().state, ProjectState::Running);
}

#[test]
fn test_restart_stopped_project_starts_it() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();

    let outcome = project.orchestrator(&runner).restart(project.root(), None).unwrap();

    assert_eq!(outcome, LifecycleOutcome::Started);
    assert_eq!(runner.calls.borrow().len(), 1);
}

#[test]
fn test_restart_single_service() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner::default();

    project
        .orchestrator(&runner)
        .restart(project.root(), Some("app"))
        .unwrap();

    let calls = runner.calls.borrow();
    assert!(calls[0].args.ends_with(&["restart".to_string(), "app".to_string()]));
    assert_eq!(project.record().state, ProjectState::Running);
}

#[test]
fn test_restart_service_requires_running() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();

    let err = project
        .orchestrator(&runner)
        .restart(project.root(), Some("app"))
        .unwrap_err();

    assert!(matches!(
        err,
        DevstackError::State(StateError::IllegalTransition { action: "restart", .. })
    ));
}

#[test]
fn test_logs_follow_streams_without_timeout() {
    let project = Project::new(ProjectState::Running);
    let runner = MockRunner {
        stream_lines: vec!["app-1  | ready".to_string(), "app-1  | GET /".to_string()],
        ..MockRunner::default()
    };
    let mut lines = Vec::new();

    project
        .orchestrator(&runner)
        .logs(
            project.root(),
            &LogOptions::new()
                .with_follow(true)
                .with_tail(Some(10))
                .with_service(Some("app".to_string())),
            &mut |line| lines.push(line.to_string()),
        )
        .unwrap();

    assert_eq!(lines, vec!["app-1  | ready", "app-1  | GET /"]);
    let calls = runner.calls.borrow();
    assert_eq!(calls[0].timeout, None);
    assert!(calls[0].args.ends_with(&[
        "logs".to_string(),
        "--follow".to_string(),
        "--tail".to_string(),
        "10".to_string(),
        "app".to_string()
    ]));
}

#[test]
fn test_custom_engine_command() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();
    let orchestrator = Orchestrator::new(
        &runner,
        JsonProjectStore::new(),
        LocalFs::new(),
        project.registry.clone(),
        EngineConfig::new(vec!["podman-compose".to_string()])
            .with_timeout(Some(Duration::from_secs(5))),
    );

    orchestrator.start(project.root()).unwrap();

    let calls = runner.calls.borrow();
    assert_eq!(calls[0].program, "podman-compose");
    assert_eq!(calls[0].args[0], "-p");
    assert_eq!(calls[0].timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_empty_engine_command_is_rejected() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();
    let orchestrator = Orchestrator::new(
        &runner,
        JsonProjectStore::new(),
        LocalFs::new(),
        project.registry.clone(),
        EngineConfig::new(Vec::new()),
    );

    let err = orchestrator.start(project.root()).unwrap_err();

    assert!(matches!(err, DevstackError::InvalidInput(_)));
    assert_eq!(project.record().state, ProjectState::Ready);
}

#[test]
fn test_registry_failure_does_not_fail_start() {
    let project = Project::new(ProjectState::Ready);
    let runner = MockRunner::default();
    let orchestrator = Orchestrator::new(
        &runner,
        JsonProjectStore::new(),
        LocalFs::new(),
        Arc::new(MockRegistryRepository {
            fail: true,
            ..MockRegistryRepository::default()
        }),
        EngineConfig::default(),
    );

    assert_eq!(
        orchestrator.start(project.root()).unwrap(),
        LifecycleOutcome::Started
    );
    assert_eq!(project.record().state, ProjectState::Running);
}
