// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mw4s sink` - print results as JSON lines

use std::io::{self, Write};

use anyhow::Result;
use mw4s_core::Config;
use mw4s_roles::Sink;
use serde_json::Value;
use tracing::info;

pub fn run(config: &Config) -> Result<()> {
    let mut sink = Sink::<Value>::bind(config)?;
    info!(endpoint = %sink.endpoint(), "sink listening");

    let received = write_results(&mut sink, &mut io::stdout().lock())?;
    sink.close();

    info!(results = received, "sink done");
    Ok(())
}

/// Write each result on its own line, flushing as they arrive
fn write_results(
    results: impl Iterator<Item = Result<Value, mw4s_roles::ProtocolError>>,
    out: &mut impl Write,
) -> Result<usize> {
    let mut received = 0;
    for result in results {
        serde_json::to_writer(&mut *out, &result?)?;
        writeln!(out)?;
        out.flush()?;
        received += 1;
    }
    Ok(received)
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
