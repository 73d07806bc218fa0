// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request-role socket
//!
//! Connects lazily: the first request waits, retrying, until the peer is
//! bound. Any later I/O failure is fatal: the error is returned and the socket
//! is closed. It never reconnects behind the caller's back.

use std::time::Duration;

use mw4s_core::Endpoint;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{ReadHalf, WriteHalf};
use tracing::{debug, info};

use crate::codec;
use crate::context::Context;
use crate::error::TransportError;
use crate::stream::{self, PeerStream};

/// Connected socket sending one request and receiving one reply at a time
pub struct ReqSocket {
    context: Context,
    endpoint: Endpoint,
    reconnect_interval: Duration,
    connection: Option<Connection>,
    awaiting_reply: bool,
    closed: bool,
}

struct Connection {
    reader: ReadHalf<PeerStream>,
    writer: WriteHalf<PeerStream>,
}

impl ReqSocket {
    /// Create a socket for `endpoint` on the process-wide context
    pub fn connect(
        endpoint: &Endpoint,
        reconnect_interval: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self::connect_in(
            &Context::instance()?,
            endpoint,
            reconnect_interval,
        ))
    }

    /// Create a socket for `endpoint` on a specific context.
    ///
    /// No connection is made until the first [`send`](Self::send).
    pub fn connect_in(
        context: &Context,
        endpoint: &Endpoint,
        reconnect_interval: Duration,
    ) -> Self {
        Self {
            context: context.clone(),
            endpoint: endpoint.clone(),
            reconnect_interval,
            connection: None,
            awaiting_reply: false,
            closed: false,
        }
    }

    /// The endpoint this socket talks to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send a request, connecting first if needed.
    ///
    /// Blocks until the peer is reachable. The reply must be collected with
    /// [`recv`](Self::recv) before the next `send`.
    pub fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.awaiting_reply {
            return Err(TransportError::OutOfOrder(
                "send called before the previous reply was received",
            ));
        }

        let result = self.context.block_on(send_frame(
            &mut self.connection,
            &self.endpoint,
            self.reconnect_interval,
            frame,
        ));
        if result.is_err() {
            self.fail();
        }
        result?;

        self.awaiting_reply = true;
        Ok(())
    }

    /// Block until the reply to the last request arrives
    pub fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if !self.awaiting_reply {
            return Err(TransportError::OutOfOrder(
                "recv called without a request in flight",
            ));
        }

        let Some(conn) = self.connection.as_mut() else {
            return Err(TransportError::ConnectionClosed);
        };
        let result = self.context.block_on(codec::read_frame(&mut conn.reader));
        if result.is_err() {
            self.fail();
        }
        let frame = result?;

        self.awaiting_reply = false;
        Ok(frame)
    }

    /// Send a request and wait for its reply
    pub fn request(&mut self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.send(frame)?;
        self.recv()
    }

    /// Encode a request, send it, and decode the reply
    pub fn request_message<Req, Rep>(&mut self, msg: &Req) -> Result<Rep, TransportError>
    where
        Req: Serialize,
        Rep: DeserializeOwned,
    {
        let frame = codec::encode(msg)?;
        let reply = self.request(&frame)?;
        codec::decode(&reply)
    }

    /// Release the connection; further calls fail with
    /// [`TransportError::Closed`]
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.connection.take().is_some() {
            debug!(endpoint = %self.endpoint, "request socket closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// I/O failures are fatal: drop the connection and refuse further use
    fn fail(&mut self) {
        self.connection = None;
        self.closed = true;
    }
}

impl std::fmt::Debug for ReqSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqSocket")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connection.is_some())
            .field("awaiting_reply", &self.awaiting_reply)
            .field("closed", &self.closed)
            .finish()
    }
}

async fn send_frame(
    connection: &mut Option<Connection>,
    endpoint: &Endpoint,
    reconnect_interval: Duration,
    frame: &[u8],
) -> Result<(), TransportError> {
    if connection.is_none() {
        *connection = Some(open(endpoint, reconnect_interval).await?);
    }
    let Some(conn) = connection.as_mut() else {
        return Err(TransportError::ConnectionClosed);
    };
    codec::write_frame(&mut conn.writer, frame).await
}

/// Connect, retrying every `interval` while the peer is not bound yet
async fn open(endpoint: &Endpoint, interval: Duration) -> Result<Connection, TransportError> {
    let mut attempts: u64 = 0;
    loop {
        match stream::connect(endpoint).await {
            Ok(stream) => {
                if attempts > 0 {
                    info!(endpoint = %endpoint, attempts, "connected after retrying");
                } else {
                    debug!(endpoint = %endpoint, "connected");
                }
                let (reader, writer) = tokio::io::split(stream);
                return Ok(Connection { reader, writer });
            }
            Err(e) if stream::is_not_ready(&e) => {
                if attempts == 0 {
                    debug!(endpoint = %endpoint, "peer not bound yet, retrying: {}", e);
                }
                attempts += 1;
                tokio::time::sleep(interval).await;
            }
            Err(e) => return Err(TransportError::Connect(endpoint.clone(), e)),
        }
    }
}

#[cfg(test)]
#[path = "req_tests.rs"]
mod tests;
