// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mw4s-roles: Source, Sink and Worker endpoints
//!
//! A [`Source`] hands tasks to any number of [`Worker`]s, which push results
//! to a single [`Sink`]. There is no broker: each worker holds one request
//! socket to the source and one to the sink.
//!
//! Shutdown is a handshake. [`Source::close`] answers every further task
//! request with `NoMoreJobs`, waits for all registered workers to exit, then
//! tells the sink. The sink's result sequence ends once it has seen the
//! source exit and every worker leave.
//!
//! ```no_run
//! use mw4s_core::Config;
//! use mw4s_roles::{Sink, Source, Worker};
//!
//! # fn main() -> Result<(), mw4s_roles::ProtocolError> {
//! let config = Config::default();
//!
//! // producer process
//! let mut source = Source::bind(&config)?;
//! source.send("job-1".to_string())?;
//! source.close()?;
//!
//! // worker process
//! let mut worker = Worker::<String, usize>::join(&config)?;
//! while let Some(task) = worker.next_task()? {
//!     worker.send(task.len())?;
//! }
//! worker.close()?;
//!
//! // consumer process
//! let mut sink = Sink::<usize>::bind(&config)?;
//! for result in &mut sink {
//!     println!("{}", result?);
//! }
//! sink.close();
//! # Ok(())
//! # }
//! ```

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod sink;
mod source;
mod worker;

pub use error::ProtocolError;
pub use sink::Sink;
pub use source::Source;
pub use worker::Worker;

pub use mw4s_core::{Config, Endpoint, Message};
pub use mw4s_transport::Context;
