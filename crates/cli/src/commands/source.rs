// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mw4s source` - hand out tasks read line by line

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mw4s_core::Config;
use mw4s_roles::Source;
use serde_json::Value;
use tracing::info;

#[derive(Args)]
pub struct SourceArgs {
    /// Read tasks from this file instead of stdin
    #[arg(long, short, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Parse each line as a JSON value instead of a plain string
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SourceArgs, config: &Config) -> Result<()> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut source = Source::<Value>::bind(config)?;
    info!(endpoint = %source.endpoint(), "source listening");

    // Close even when the input is bad, so workers are released
    let sent = send_all(&mut source, reader, args.json);
    let closed = source.close();
    let sent = sent?;
    closed?;

    info!(tasks = sent, "source done");
    Ok(())
}

fn send_all(source: &mut Source<Value>, reader: impl BufRead, json: bool) -> Result<usize> {
    let mut sent = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(task) =
            parse_task(&line, json).with_context(|| format!("invalid task on line {}", index + 1))?
        else {
            continue;
        };
        source.send(task)?;
        sent += 1;
    }
    Ok(sent)
}

/// Turn one input line into a task. Blank lines yield no task.
pub(crate) fn parse_task(line: &str, json: bool) -> Result<Option<Value>> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return Ok(None);
    }
    if json {
        Ok(Some(serde_json::from_str(line)?))
    } else {
        Ok(Some(Value::String(line.to_string())))
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
