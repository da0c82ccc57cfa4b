//! Blocking subprocess runner
//!
//! Bounded runs redirect output to anonymous temp files and poll for exit.
//! Streaming mode pipes stdout only and checks the deadline after each line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::ports::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        debug!(command = %spec.display(), timeout = ?spec.timeout, "running");

        let mut stdout = capture_file(spec)?;
        let mut stderr = capture_file(spec)?;
        let mut child = command(spec)
            .stdout(clone_handle(spec, &stdout)?)
            .stderr(clone_handle(spec, &stderr)?)
            .spawn()
            .map_err(|e| spawn_error(spec, e))?;

        let status = wait(&mut child, spec)?;

        Ok(ProcessOutput {
            code: status.code(),
            stdout: read_back(spec, &mut stdout)?,
            stderr: read_back(spec, &mut stderr)?,
        })
    }

    fn stream(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ProcessOutput, ProcessError> {
        debug!(command = %spec.display(), timeout = ?spec.timeout, "streaming");

        let mut stderr = capture_file(spec)?;
        let mut child = command(spec)
            .stdout(Stdio::piped())
            .stderr(clone_handle(spec, &stderr)?)
            .spawn()
            .map_err(|e| spawn_error(spec, e))?;

        let started = Instant::now();
        if let Some(out) = child.stdout.take() {
            if let Err(e) = pump_lines(out, spec, started, on_line) {
                kill(&mut child);
                return Err(e);
            }
        }

        let status = wait(&mut child, spec)?;
        Ok(ProcessOutput {
            code: status.code(),
            stdout: String::new(),
            stderr: read_back(spec, &mut stderr)?,
        })
    }
}

/// Feed each stdout line to `on_line`, lossily decoded.
fn pump_lines(
    out: impl Read,
    spec: &CommandSpec,
    started: Instant,
    on_line: &mut dyn FnMut(&str),
) -> Result<(), ProcessError> {
    let mut reader = BufReader::new(out);
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| ProcessError::Output {
                program: spec.program.clone(),
                source: e,
            })?;
        if read == 0 {
            return Ok(());
        }
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        on_line(&String::from_utf8_lossy(&line));

        if let Some(limit) = spec.timeout {
            if started.elapsed() >= limit {
                return Err(ProcessError::Timeout {
                    program: spec.program.clone(),
                    after: limit,
                });
            }
        }
    }
}

fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).stdin(Stdio::null());
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    cmd
}

/// Poll until exit, killing the child once the timeout passes.
fn wait(child: &mut Child, spec: &CommandSpec) -> Result<ExitStatus, ProcessError> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => return Err(spawn_error(spec, e)),
        }

        if let Some(limit) = spec.timeout {
            if started.elapsed() >= limit {
                kill(child);
                return Err(ProcessError::Timeout {
                    program: spec.program.clone(),
                    after: limit,
                });
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn capture_file(spec: &CommandSpec) -> Result<File, ProcessError> {
    tempfile::tempfile().map_err(|e| spawn_error(spec, e))
}

fn clone_handle(spec: &CommandSpec, file: &File) -> Result<Stdio, ProcessError> {
    file.try_clone()
        .map(Stdio::from)
        .map_err(|e| spawn_error(spec, e))
}

fn read_back(spec: &CommandSpec, file: &mut File) -> Result<String, ProcessError> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut bytes))
        .map_err(|e| ProcessError::Output {
            program: spec.program.clone(),
            source: e,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn spawn_error(spec: &CommandSpec, e: io::Error) -> ProcessError {
    if e.kind() == io::ErrorKind::NotFound {
        ProcessError::NotFound {
            program: spec.program.clone(),
        }
    } else {
        ProcessError::Spawn {
            program: spec.program.clone(),
            source: e,
        }
    }
}
