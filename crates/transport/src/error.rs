// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport errors

use mw4s_core::Endpoint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    Bind(Endpoint, #[source] std::io::Error),

    #[error("Failed to connect to {0}: {1}")]
    Connect(Endpoint, #[source] std::io::Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Socket used out of order: {0}")]
    OutOfOrder(&'static str),

    #[error("Socket is closed")]
    Closed,
}
