//! Stand-in for the container engine.
//!
//! The script appends each invocation's arguments to `calls.log`, answers
//! `ps` with two containers and `logs` with two lines. Creating
//! `fail-<subcommand>` next to it makes that subcommand exit 1 with a
//! daemon-style message on stderr.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

use super::env::TestEnv;

const SCRIPT: &str = r#"#!/bin/sh
here=$(dirname "$0")
echo "$*" >> "$here/calls.log"
sub=""
for arg in "$@"; do
  case "$arg" in
    up|down|ps|logs|restart) sub="$arg"; break ;;
  esac
done
if [ -n "$sub" ] && [ -f "$here/fail-$sub" ]; then
  echo "Error response from daemon: driver failed programming external connectivity" >&2
  echo "Bind for 0.0.0.0:5432 failed: port is already allocated" >&2
  exit 1
fi
case "$sub" in
  ps)
    echo '{"Name":"shop_app","Service":"app","State":"running","Status":"Up 5 seconds","ExitCode":0,"Publishers":null}'
    echo '{"Name":"shop_web","Service":"web","State":"running","Status":"Up 5 seconds","ExitCode":0,"Publishers":[{"URL":"0.0.0.0","TargetPort":80,"PublishedPort":8000,"Protocol":"tcp"}]}'
    ;;
  logs)
    echo "app-1  | ready to handle connections"
    echo "web-1  | GET / 200"
    ;;
esac
exit 0
"#;

pub struct FakeEngine {
    dir: TempDir,
}

impl FakeEngine {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-engine");
        std::fs::write(&script, SCRIPT).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    pub fn script(&self) -> PathBuf {
        self.dir.path().join("fake-engine")
    }

    /// Route `env`'s runs through this engine.
    pub fn attach(&self, env: TestEnv) -> TestEnv {
        env.with_env("DEVSTACK_ENGINE", self.script().display().to_string())
    }

    /// Make `subcommand` fail from now on.
    pub fn fail(&self, subcommand: &str) {
        std::fs::write(self.dir.path().join(format!("fail-{subcommand}")), "").unwrap();
    }

    pub fn recover(&self, subcommand: &str) {
        let _ = std::fs::remove_file(self.dir.path().join(format!("fail-{subcommand}")));
    }

    /// Argument lines of every invocation so far.
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
