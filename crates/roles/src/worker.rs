// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker: pulls tasks from the source and pushes results to the sink
//!
//! A worker registers with the source first and the sink second, and
//! deregisters in the same order. Each request it makes expects one specific
//! reply; anything else is a protocol violation.

use std::marker::PhantomData;

use mw4s_core::{Config, Endpoint, Message};
use mw4s_transport::{Context, ReqSocket};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, info, warn, Span};
use uuid::Uuid;

use crate::error::ProtocolError;

const ROLE: &str = "worker";

/// A worker consuming tasks of type `T` and producing results of type `R`
pub struct Worker<T, R> {
    id: Uuid,
    span: Span,
    source: ReqSocket,
    sink: ReqSocket,
    /// Set once the source has answered a task request with `NoMoreJobs`
    exhausted: bool,
    closed: bool,
    _types: PhantomData<fn(R) -> T>,
}

impl<T, R> Worker<T, R>
where
    T: DeserializeOwned,
    R: Serialize,
{
    /// Register with the source and sink named in `config`, on the
    /// process-wide context
    pub fn join(config: &Config) -> Result<Self, ProtocolError> {
        Self::join_in(&Context::instance()?, config)
    }

    /// Register with the source and sink named in `config`, on a specific
    /// context.
    ///
    /// Blocks until both have acknowledged. If the sink cannot be joined, the
    /// worker withdraws from the source again before returning the error.
    pub fn join_in(context: &Context, config: &Config) -> Result<Self, ProtocolError> {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("worker", %id);
        let guard = span.enter();

        let mut source = ReqSocket::connect_in(context, &config.source, config.reconnect_interval);
        let mut sink = ReqSocket::connect_in(context, &config.sink, config.reconnect_interval);

        expect_ack(&mut source, "source", &Message::<()>::WorkerJoin)?;
        debug!(source = %config.source, "joined source");

        if let Err(e) = expect_ack(&mut sink, "sink", &Message::<()>::WorkerJoin) {
            warn!(sink = %config.sink, "Failed to join sink, withdrawing from source: {}", e);
            if let Err(e) = expect_ack(&mut source, "source", &Message::<()>::WorkerExited) {
                warn!("Failed to withdraw from source: {}", e);
            }
            return Err(e);
        }
        info!(source = %config.source, sink = %config.sink, "worker joined");

        drop(guard);
        Ok(Self {
            id,
            span,
            source,
            sink,
            exhausted: false,
            closed: false,
            _types: PhantomData,
        })
    }

    /// Ask the source for the next task.
    ///
    /// Returns `Ok(None)` once the source has no more jobs; every later call
    /// returns `Ok(None)` without contacting the source.
    pub fn next_task(&mut self) -> Result<Option<T>, ProtocolError> {
        if self.closed {
            return Err(ProtocolError::Closed(ROLE));
        }
        if self.exhausted {
            return Ok(None);
        }
        let _guard = self.span.enter();

        let reply: Message<T> = self.source.request_message(&Message::<()>::Ack)?;
        match reply {
            Message::Task(task) => Ok(Some(task)),
            Message::NoMoreJobs => {
                self.exhausted = true;
                debug!("source has no more jobs");
                Ok(None)
            }
            other @ (Message::Ack
            | Message::WorkerJoin
            | Message::WorkerExited
            | Message::SourceExited
            | Message::Result(_)) => Err(ProtocolError::InvalidResponse {
                peer: "source",
                expected: "task or no_more_jobs",
                got: other.kind(),
            }),
        }
    }

    /// Submit a result to the sink and wait for its acknowledgement
    pub fn send(&mut self, result: R) -> Result<(), ProtocolError> {
        if self.closed {
            return Err(ProtocolError::Closed(ROLE));
        }
        let _guard = self.span.enter();
        expect_ack(&mut self.sink, "sink", &Message::Result(result))
    }
}

impl<T, R> Worker<T, R> {
    /// Deregister from the source, then the sink, and release both sockets.
    ///
    /// Idempotent. The worker is closed even if a deregistration fails; the
    /// first failure is returned.
    pub fn close(&mut self) -> Result<(), ProtocolError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _guard = self.span.enter();

        let from_source = expect_ack(&mut self.source, "source", &Message::<()>::WorkerExited);
        let from_sink = expect_ack(&mut self.sink, "sink", &Message::<()>::WorkerExited);
        self.source.close();
        self.sink.close();

        from_source?;
        from_sink?;
        info!("worker exited");
        Ok(())
    }

    /// Unique id of this worker, recorded on its log span
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_endpoint(&self) -> &Endpoint {
        self.source.endpoint()
    }

    pub fn sink_endpoint(&self) -> &Endpoint {
        self.sink.endpoint()
    }

    /// Check if the source has reported it has no more jobs
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Send `msg` and require an `Ack` in reply
fn expect_ack<M: Serialize>(
    socket: &mut ReqSocket,
    peer: &'static str,
    msg: &M,
) -> Result<(), ProtocolError> {
    let reply: Message<IgnoredAny> = socket.request_message(msg)?;
    if reply.is_ack() {
        Ok(())
    } else {
        Err(ProtocolError::InvalidResponse {
            peer,
            expected: "ack",
            got: reply.kind(),
        })
    }
}

impl<T, R> std::fmt::Debug for Worker<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("source", self.source.endpoint())
            .field("sink", self.sink.endpoint())
            .field("exhausted", &self.exhausted)
            .field("closed", &self.closed)
            .finish()
    }
}

impl<T, R> Drop for Worker<T, R> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!(id = %self.id, "worker dropped without close(), deregistering");
        if let Err(e) = self.close() {
            warn!(id = %self.id, "Failed to deregister worker: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
