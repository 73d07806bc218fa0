// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mw4s worker` - run a program for each task

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use mw4s_core::Config;
use mw4s_roles::Worker;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct WorkerArgs {
    /// Program to run for each task, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM"
    )]
    pub command: Vec<String>,
}

/// Result submitted to the sink for one task
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub task: Value,
    pub output: String,
    /// Exit code, or `None` if the program was killed by a signal
    pub status: Option<i32>,
}

pub fn run(args: WorkerArgs, config: &Config) -> Result<()> {
    let (program, program_args) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no program given"))?;

    let mut worker = Worker::<Value, Outcome>::join(config)?;
    info!(id = %worker.id(), program = %program, "worker started");

    // Deregister even when a task could not be run
    let handled = process(&mut worker, program, program_args);
    let closed = worker.close();
    let handled = handled?;
    closed?;

    info!(tasks = handled, "worker done");
    Ok(())
}

fn process(worker: &mut Worker<Value, Outcome>, program: &str, args: &[String]) -> Result<usize> {
    let mut handled = 0;
    while let Some(task) = worker.next_task()? {
        let outcome = run_task(program, args, task)?;
        if outcome.status != Some(0) {
            warn!(status = ?outcome.status, program, "task program failed");
        }
        worker.send(outcome)?;
        handled += 1;
    }
    Ok(handled)
}

/// Run `program` with the task on stdin: strings as-is, anything else as JSON
pub(crate) fn run_task(program: &str, args: &[String], task: Value) -> Result<Outcome> {
    let input = match &task {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start {}", program))?;

    // Written from its own thread: the program may fill its stdout pipe
    // before it has read all of its input
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin of {} not captured", program))?;
    let feeder = thread::spawn(move || feed(stdin, input));

    let output = child
        .wait_with_output()
        .with_context(|| format!("failed to wait for {}", program))?;

    match feeder.join() {
        Ok(Ok(())) => {}
        // The program exited without reading all of its input
        Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!(program, "program did not read its whole input");
        }
        Ok(Err(e)) => warn!(program, "Failed to write task to program: {}", e),
        Err(_) => warn!(program, "stdin writer panicked"),
    }

    Ok(Outcome {
        task,
        output: String::from_utf8_lossy(&output.stdout).into_owned(),
        status: output.status.code(),
    })
}

fn feed(mut stdin: impl Write, input: String) -> io::Result<()> {
    stdin.write_all(input.as_bytes())?;
    // Dropping stdin closes the pipe
    Ok(())
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
