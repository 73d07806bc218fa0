// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol messages
//!
//! Every frame exchanged between a worker and the source or sink is one
//! [`Message`]. The set is closed: each receive point matches on it
//! exhaustively and anything it does not expect is a protocol violation.

use serde::{Deserialize, Serialize};

/// A protocol message carrying an application payload of type `P`.
///
/// On the wire this is a JSON object tagged by `"type"`, with task and result
/// payloads under `"payload"`:
///
/// ```json
/// {"type": "worker_join"}
/// {"type": "task", "payload": {"url": "https://example.com"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Message<P> {
    /// The null message.
    ///
    /// Replies use it to acknowledge a control message or a result. Sent by a
    /// worker to the source it is a plain request for the next task.
    Ack,
    /// A worker registers with the source or sink.
    WorkerJoin,
    /// A worker deregisters from the source or sink.
    WorkerExited,
    /// The source has stopped handing out tasks.
    NoMoreJobs,
    /// The source has drained all workers and shut down.
    SourceExited,
    /// A unit of work handed from the source to a worker.
    Task(P),
    /// The outcome of a task submitted from a worker to the sink.
    Result(P),
}

impl<P> Message<P> {
    /// Tag name of this message, as used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Ack => "ack",
            Message::WorkerJoin => "worker_join",
            Message::WorkerExited => "worker_exited",
            Message::NoMoreJobs => "no_more_jobs",
            Message::SourceExited => "source_exited",
            Message::Task(_) => "task",
            Message::Result(_) => "result",
        }
    }

    /// Check if this is the null message
    pub fn is_ack(&self) -> bool {
        matches!(self, Message::Ack)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
