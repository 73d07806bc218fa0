// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport context: the runtime that drives socket I/O

use std::future::Future;
use std::sync::{Arc, OnceLock};

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::TransportError;

/// I/O threads of the process-wide context
const DEFAULT_IO_THREADS: usize = 2;

static INSTANCE: OnceLock<Context> = OnceLock::new();

/// Runtime shared by the sockets created on it.
///
/// Accept loops and per-peer connections run as tasks on the context; socket
/// calls block the caller until their I/O completes. The runtime is private to
/// the transport, so socket calls must not be made from inside another async
/// runtime's worker threads.
///
/// Cloning is cheap; the runtime shuts down when the last clone is dropped.
#[derive(Clone)]
pub struct Context {
    runtime: Arc<Runtime>,
}

impl Context {
    /// Create a standalone context with its own I/O threads
    pub fn new(io_threads: usize) -> Result<Self, TransportError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(io_threads.max(1))
            .thread_name("mw4s-io")
            .enable_io()
            .enable_time()
            .build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    /// The process-wide context, created on first use and kept until the
    /// process exits
    pub fn instance() -> Result<Self, TransportError> {
        if let Some(context) = INSTANCE.get() {
            return Ok(context.clone());
        }
        let context = Self::new(DEFAULT_IO_THREADS)?;
        // A concurrent first call may have won the race; its context is kept
        // and ours is dropped.
        Ok(INSTANCE.get_or_init(|| context).clone())
    }

    /// Run a future to completion on the calling thread
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Spawn a background task onto the I/O threads
    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("handles", &Arc::strong_count(&self.runtime))
            .finish()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
