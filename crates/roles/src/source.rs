// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source: hands out tasks to workers
//!
//! State machine:
//!
//! ```text
//! Open(n) --close()--> Draining(n) --n = 0, SourceExited acked--> Closed
//! ```
//!
//! While open, each plain request is answered with a task. While draining,
//! each plain request is answered with `NoMoreJobs`. Joins and exits are
//! acknowledged and counted in both states.

use std::marker::PhantomData;

use mw4s_core::{Config, Endpoint, Message, WorkerCount};
use mw4s_transport::{Context, RepSocket, ReqSocket};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ProtocolError;

const ROLE: &str = "source";

/// Producer endpoint handing tasks of type `T` to workers
pub struct Source<T> {
    /// Workers request tasks here (`None` once released)
    tasks: Option<RepSocket>,
    /// Used once, to tell the sink the source has exited
    sink: Option<ReqSocket>,
    endpoint: Endpoint,
    sink_endpoint: Endpoint,
    workers: WorkerCount,
    /// Set by `close()`; task requests are answered with `NoMoreJobs`
    draining: bool,
    _task: PhantomData<fn(T)>,
}

/// What a request asks of the source, after join/exit bookkeeping
enum Request {
    Task,
    Handled,
}

impl<T: Serialize> Source<T> {
    /// Bind `config.source` on the process-wide context
    pub fn bind(config: &Config) -> Result<Self, ProtocolError> {
        Self::bind_in(&Context::instance()?, config)
    }

    /// Bind `config.source` on a specific context
    pub fn bind_in(context: &Context, config: &Config) -> Result<Self, ProtocolError> {
        let tasks = RepSocket::bind_in(context, &config.source)?;
        let sink = ReqSocket::connect_in(context, &config.sink, config.reconnect_interval);
        let endpoint = tasks.endpoint().clone();

        info!(endpoint = %endpoint, sink = %config.sink, "source bound");

        Ok(Self {
            tasks: Some(tasks),
            sink: Some(sink),
            endpoint,
            sink_endpoint: config.sink.clone(),
            workers: WorkerCount::new(),
            draining: false,
            _task: PhantomData,
        })
    }

    /// Hand `task` to the next worker that asks for one.
    ///
    /// Blocks until a task request arrives, servicing joins and exits in the
    /// meantime. Exactly one worker receives the task.
    pub fn send(&mut self, task: T) -> Result<(), ProtocolError> {
        if self.draining {
            return Err(ProtocolError::Closed(ROLE));
        }
        let reply = Message::Task(task);
        loop {
            match self.serve()? {
                Request::Task => {
                    self.socket()?.send_message(&reply)?;
                    debug!(workers = %self.workers, "task handed out");
                    return Ok(());
                }
                Request::Handled => continue,
            }
        }
    }

    /// Stop handing out tasks, wait for every worker to exit, then notify the
    /// sink and release both sockets.
    ///
    /// Idempotent. Blocks until the last registered worker has exited. If the
    /// drain fails part way, calling `close` again resumes it.
    pub fn close(&mut self) -> Result<(), ProtocolError> {
        if self.is_closed() {
            return Ok(());
        }
        self.draining = true;

        info!(workers = %self.workers, "source draining");
        let no_more_jobs = Message::<T>::NoMoreJobs;
        while !self.workers.is_zero() {
            match self.serve()? {
                Request::Task => self.socket()?.send_message(&no_more_jobs)?,
                Request::Handled => {}
            }
        }

        let sink = self.sink.as_mut().ok_or(ProtocolError::Closed(ROLE))?;
        let reply: Message<serde::de::IgnoredAny> =
            sink.request_message(&Message::<T>::SourceExited)?;
        if !reply.is_ack() {
            return Err(ProtocolError::InvalidResponse {
                peer: "sink",
                expected: "ack",
                got: reply.kind(),
            });
        }

        self.release();
        info!(sink = %self.sink_endpoint, "source exited");
        Ok(())
    }

    /// Receive one request and settle it unless it asks for a task
    fn serve(&mut self) -> Result<Request, ProtocolError> {
        let socket = self.tasks.as_mut().ok_or(ProtocolError::Closed(ROLE))?;
        let request: Message<serde::de::IgnoredAny> = socket.recv_message()?;
        match request {
            Message::Ack => Ok(Request::Task),
            Message::WorkerJoin => {
                socket.send_message(&Message::<T>::Ack)?;
                let workers = self.workers.join();
                debug!(workers, "worker joined");
                Ok(Request::Handled)
            }
            Message::WorkerExited => {
                let workers = self
                    .workers
                    .exit()
                    .map_err(|_| ProtocolError::UnregisteredWorker(ROLE))?;
                socket.send_message(&Message::<T>::Ack)?;
                debug!(workers, "worker exited");
                Ok(Request::Handled)
            }
            other @ (Message::NoMoreJobs
            | Message::SourceExited
            | Message::Task(_)
            | Message::Result(_)) => Err(ProtocolError::InvalidRequest {
                role: ROLE,
                expected: "ack, worker_join or worker_exited",
                got: other.kind(),
            }),
        }
    }

    fn socket(&mut self) -> Result<&mut RepSocket, ProtocolError> {
        self.tasks.as_mut().ok_or(ProtocolError::Closed(ROLE))
    }
}

impl<T> Source<T> {
    /// The bound endpoint, with any OS-assigned port filled in
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of workers currently registered
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Check if the shutdown handshake has completed
    pub fn is_closed(&self) -> bool {
        self.tasks.is_none()
    }

    fn release(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.close();
        }
        self.tasks = None;
    }
}

impl<T> std::fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("endpoint", &self.endpoint)
            .field("sink", &self.sink_endpoint)
            .field("workers", &self.workers.get())
            .field("draining", &self.draining)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> Drop for Source<T> {
    fn drop(&mut self) {
        // The drain can block forever, so it is never run implicitly
        if self.tasks.is_some() {
            warn!(
                endpoint = %self.endpoint,
                workers = %self.workers,
                "source dropped before close() completed; sink will not be told it exited"
            );
            self.release();
        }
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
