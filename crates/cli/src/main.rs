// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mw4s - run a source, sink or worker from the command line

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod logging;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{sink, source, worker};
use mw4s_core::{Config, Endpoint};

#[derive(Parser)]
#[command(
    name = "mw4s",
    version,
    about = "MW4S - one source, many workers, one sink"
)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source endpoint (tcp://host:port or ipc:///path)
    #[arg(long, global = true, value_name = "ADDR")]
    source: Option<Endpoint>,

    /// Sink endpoint (tcp://host:port or ipc:///path)
    #[arg(long, global = true, value_name = "ADDR")]
    sink: Option<Endpoint>,

    /// How long the sink lingers before releasing its socket
    #[arg(long, global = true, value_name = "MS")]
    close_grace_ms: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hand out one task per input line, then shut down
    Source(source::SourceArgs),
    /// Print every result as a JSON line until the pipeline ends
    Sink,
    /// Run a program for each task and submit its output
    Worker(worker::WorkerArgs),
}

impl Cli {
    /// Resolve the config: file (or defaults), then environment, then flags
    fn resolve_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let mut config = config.apply_env()?;

        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(sink) = &self.sink {
            config.sink = sink.clone();
        }
        if let Some(ms) = self.close_grace_ms {
            config.close_grace = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_file.as_deref())?;
    let config = cli.resolve_config()?;

    tracing::debug!(source = %config.source, sink = %config.sink, "config resolved");

    match cli.command {
        Commands::Source(args) => source::run(args, &config),
        Commands::Sink => sink::run(&config),
        Commands::Worker(args) => worker::run(args, &config),
    }
}
