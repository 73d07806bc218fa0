// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol errors
//!
//! Every variant is fatal to the endpoint that raised it: nothing is retried
//! or recovered locally.

use mw4s_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid request at {role}: got {got}, expected {expected}")]
    InvalidRequest {
        role: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Invalid response from {peer}: got {got}, expected {expected}")]
    InvalidResponse {
        peer: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Worker exit at {0} without a matching join")]
    UnregisteredWorker(&'static str),

    #[error("{0} is closed")]
    Closed(&'static str),

    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),
}

impl From<TransportError> for ProtocolError {
    fn from(e: TransportError) -> Self {
        match e {
            // A frame that does not decode is a message nobody expects
            TransportError::Json(e) => ProtocolError::Malformed(e),
            other => ProtocolError::Transport(other),
        }
    }
}

impl ProtocolError {
    /// Check if this error is a protocol violation by the peer, as opposed
    /// to a transport failure or misuse of a closed endpoint
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidRequest { .. }
                | ProtocolError::InvalidResponse { .. }
                | ProtocolError::Malformed(_)
                | ProtocolError::UnregisteredWorker(_)
        )
    }
}
