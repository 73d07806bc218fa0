// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink: collects results from workers
//!
//! Every request is acknowledged before it is looked at, so a worker is never
//! left waiting on a sink that is about to fail. Once the source has reported
//! its exit and every registered worker has left, the result sequence ends.

use std::marker::PhantomData;
use std::thread;
use std::time::Duration;

use mw4s_core::{Config, Endpoint, Message, WorkerCount};
use mw4s_transport::{codec, Context, RepSocket};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::ProtocolError;

const ROLE: &str = "sink";

/// Consumer endpoint yielding results of type `R`.
///
/// Iterating yields each result in arrival order and stops after the
/// shutdown handshake completes. A protocol violation is yielded as an error
/// and ends the sequence.
pub struct Sink<R> {
    results: Option<RepSocket>,
    endpoint: Endpoint,
    workers: WorkerCount,
    source_closed: bool,
    close_grace: Duration,
    failed: bool,
    _result: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned> Sink<R> {
    /// Bind `config.sink` on the process-wide context
    pub fn bind(config: &Config) -> Result<Self, ProtocolError> {
        Self::bind_in(&Context::instance()?, config)
    }

    /// Bind `config.sink` on a specific context
    pub fn bind_in(context: &Context, config: &Config) -> Result<Self, ProtocolError> {
        let results = RepSocket::bind_in(context, &config.sink)?;
        let endpoint = results.endpoint().clone();

        info!(endpoint = %endpoint, "sink bound");

        Ok(Self {
            results: Some(results),
            endpoint,
            workers: WorkerCount::new(),
            source_closed: false,
            close_grace: config.close_grace,
            failed: false,
            _result: PhantomData,
        })
    }

    /// Block until the next result arrives.
    ///
    /// Returns `Ok(None)` once the source has exited and no workers remain.
    /// Joins, exits and the source's exit notice are acknowledged and
    /// recorded along the way.
    pub fn next_result(&mut self) -> Result<Option<R>, ProtocolError> {
        loop {
            if self.is_done() {
                return Ok(None);
            }
            let socket = self.results.as_mut().ok_or(ProtocolError::Closed(ROLE))?;

            let frame = socket.recv()?;
            socket.send_message(&Message::<()>::Ack)?;

            let msg: Message<R> = codec::decode(&frame)?;
            match msg {
                Message::Result(result) => return Ok(Some(result)),
                Message::WorkerJoin => {
                    let workers = self.workers.join();
                    debug!(workers, "worker joined");
                }
                Message::WorkerExited => {
                    let workers = self
                        .workers
                        .exit()
                        .map_err(|_| ProtocolError::UnregisteredWorker(ROLE))?;
                    debug!(workers, "worker exited");
                }
                Message::SourceExited => {
                    self.source_closed = true;
                    info!(workers = %self.workers, "source exited");
                }
                other @ (Message::Ack | Message::NoMoreJobs | Message::Task(_)) => {
                    return Err(ProtocolError::InvalidRequest {
                        role: ROLE,
                        expected: "result, worker_join, worker_exited or source_exited",
                        got: other.kind(),
                    });
                }
            }
        }
    }
}

impl<R> Sink<R> {
    /// Check if the source has exited and every worker has left
    pub fn is_done(&self) -> bool {
        self.source_closed && self.workers.is_zero()
    }

    /// Linger for the close grace, then release the socket.
    ///
    /// The grace period lets the final acknowledgements reach their workers
    /// before the connections are torn down. Idempotent.
    pub fn close(&mut self) {
        let Some(results) = self.results.take() else {
            return;
        };
        if !self.close_grace.is_zero() {
            debug!(grace = ?self.close_grace, "sink lingering before close");
            thread::sleep(self.close_grace);
        }
        drop(results);
        info!(endpoint = %self.endpoint, "sink closed");
    }

    /// The bound endpoint, with any OS-assigned port filled in
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of workers currently registered
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Check if the source has reported its exit
    pub fn source_closed(&self) -> bool {
        self.source_closed
    }
}

impl<R: DeserializeOwned> Iterator for Sink<R> {
    type Item = Result<R, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_result().transpose();
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}

impl<R> std::fmt::Debug for Sink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("endpoint", &self.endpoint)
            .field("workers", &self.workers.get())
            .field("source_closed", &self.source_closed)
            .field("closed", &self.results.is_none())
            .finish()
    }
}

impl<R> Drop for Sink<R> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
