//! Test environment for isolated devstack runs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Result of running the devstack binary
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Parse stdout as a single JSON document.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|e| panic!("expected JSON output ({e}):\n{}", self.combined_output()))
    }

    /// Parse stdout as NDJSON.
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

/// Isolated environment: the real home, registry and config are never touched.
pub struct TestEnv {
    pub workspace: TempDir,
    pub home: TempDir,
    extra_env: Vec<(String, String)>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            workspace: tempfile::tempdir().unwrap(),
            home: tempfile::tempdir().unwrap(),
            extra_env: Vec::new(),
        }
    }

    /// Set an environment variable for every run.
    pub fn with_env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.extra_env.push((key.to_string(), value.into()));
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.workspace.path().join(relative)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.home.path().join("registry.json")
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_in(self.workspace.path(), args)
    }

    pub fn run_in(&self, cwd: &Path, args: &[&str]) -> TestResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_devstack"));
        cmd.current_dir(cwd)
            .args(args)
            .env("DEVSTACK_HOME", self.home.path())
            .env("DEVSTACK_REGISTRY_PATH", self.registry_path())
            .env(
                "DEVSTACK_TEMPLATES",
                Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"),
            )
            .env_remove("DEVSTACK_ENGINE")
            .env_remove("DEVSTACK_LOG")
            .env_remove("DEVSTACK_TIMEOUT");
        for (key, value) in &self.extra_env {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute devstack");
        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// `devstack init <name> --stack laravel` plus `extra`; panics on failure.
    pub fn init(&self, name: &str, extra: &[&str]) -> PathBuf {
        let mut args = vec!["init", name, "--stack", "laravel"];
        args.extend_from_slice(extra);
        let result = self.run(&args);
        assert!(result.success, "init failed:\n{}", result.combined_output());
        self.path(name)
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("failed to read {relative}: {e}"))
    }

    pub fn record(&self, project: &str) -> serde_json::Value {
        serde_json::from_str(&self.read(&format!("{project}/.devstack/project.json"))).unwrap()
    }
}
