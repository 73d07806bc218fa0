// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use tempfile::TempDir;

/// Path of the built `mw4s` binary
pub fn mw4s_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("mw4s")
}

/// A pair of ipc endpoints inside a fresh temp directory.
/// The directory is removed when this is dropped.
pub struct Endpoints {
    dir: TempDir,
    pub source: String,
    pub sink: String,
}

impl Endpoints {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let source = format!("ipc://{}", dir.path().join("source.sock").display());
        let sink = format!("ipc://{}", dir.path().join("sink.sock").display());
        Self { dir, source, sink }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Global flags pointing a command at these endpoints
    pub fn flags(&self) -> Vec<String> {
        vec![
            "--source".to_string(),
            self.source.clone(),
            "--sink".to_string(),
            self.sink.clone(),
            "--close-grace-ms".to_string(),
            "0".to_string(),
        ]
    }
}

/// A background `mw4s` process, killed on drop unless waited for.
///
/// Usage: let sink = Running::spawn(&endpoints, &["sink"]);
pub struct Running {
    child: Option<Child>,
}

impl Running {
    pub fn spawn(endpoints: &Endpoints, args: &[&str]) -> Self {
        Self::start(endpoints, args, Stdio::null())
    }

    /// Spawn with stdin held open until [`feed`](Self::feed) is called
    pub fn spawn_piped(endpoints: &Endpoints, args: &[&str]) -> Self {
        Self::start(endpoints, args, Stdio::piped())
    }

    fn start(endpoints: &Endpoints, args: &[&str], stdin: Stdio) -> Self {
        let child = Command::new(mw4s_bin())
            .args(endpoints.flags())
            .args(args)
            .env_remove("MW4S_SOURCE")
            .env_remove("MW4S_SINK")
            .env("MW4S_RECONNECT_MS", "10")
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn mw4s");
        Self { child: Some(child) }
    }

    /// Write `input` to stdin and close it
    pub fn feed(&mut self, input: &str) {
        let child = self.child.as_mut().expect("process already finished");
        let mut stdin = child.stdin.take().expect("stdin not piped");
        stdin
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
    }

    /// Wait for the process to finish and collect its output
    pub fn finish(mut self) -> Output {
        self.child
            .take()
            .expect("process already finished")
            .wait_with_output()
            .expect("Failed to wait for mw4s")
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Parse each stdout line as JSON
pub fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("sink printed invalid JSON"))
        .collect()
}
