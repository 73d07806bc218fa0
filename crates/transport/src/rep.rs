// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply-role socket
//!
//! Binds an endpoint and accepts any number of peers. Each peer connection is
//! served by its own task, which forwards one request at a time into a shared
//! queue and waits for the owner's reply before reading the next one. The
//! owner pulls requests from the queue in arrival order, so peers are served
//! first-arrived, first-served.
//!
//! Dropping the socket stops accepting and closes idle peers, but a reply
//! already handed to [`RepSocket::send`] is still written out, for up to
//! [`LINGER`].

use std::path::PathBuf;
use std::time::Duration;

use mw4s_core::Endpoint;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::codec;
use crate::context::Context;
use crate::error::TransportError;
use crate::stream::{Listener, PeerStream};

/// Pause after a failed accept, so a persistent failure (e.g. fd exhaustion)
/// does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// How long a dropped socket waits for in-flight replies to be written
const LINGER: Duration = Duration::from_secs(5);

/// A request waiting for the owner, with the channel its reply goes back on
struct Inbound {
    frame: Vec<u8>,
    reply: oneshot::Sender<Vec<u8>>,
}

/// Bound socket serving a strict receive → reply alternation
pub struct RepSocket {
    context: Context,
    endpoint: Endpoint,
    requests: mpsc::UnboundedReceiver<Inbound>,
    pending: Option<oneshot::Sender<Vec<u8>>>,
    acceptor: JoinHandle<()>,
    // Dropped to tell the acceptor and its peers to wind down
    shutdown: Option<watch::Sender<()>>,
    // Unix socket file to remove on drop
    socket_path: Option<PathBuf>,
}

impl RepSocket {
    /// Bind on the process-wide context
    pub fn bind(endpoint: &Endpoint) -> Result<Self, TransportError> {
        Self::bind_in(&Context::instance()?, endpoint)
    }

    /// Bind on a specific context
    pub fn bind_in(context: &Context, endpoint: &Endpoint) -> Result<Self, TransportError> {
        let (listener, resolved) = context
            .block_on(Listener::bind(endpoint))
            .map_err(|e| TransportError::Bind(endpoint.clone(), e))?;

        let (tx, requests) = mpsc::unbounded_channel();
        let (shutdown, closing) = watch::channel(());
        let acceptor = context.spawn(accept_loop(listener, tx, closing, resolved.clone()));

        debug!(endpoint = %resolved, "reply socket bound");

        Ok(Self {
            context: context.clone(),
            socket_path: resolved.path().map(|p| p.to_path_buf()),
            endpoint: resolved,
            requests,
            pending: None,
            acceptor,
            shutdown: Some(shutdown),
        })
    }

    /// The bound endpoint, with any OS-assigned port filled in
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Block until the next request arrives and return its payload.
    ///
    /// The request must be answered with [`send`](Self::send) before the
    /// next `recv`.
    pub fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.pending.is_some() {
            return Err(TransportError::OutOfOrder(
                "recv called while a reply is still owed",
            ));
        }

        let inbound = self
            .context
            .block_on(self.requests.recv())
            .ok_or(TransportError::Closed)?;
        self.pending = Some(inbound.reply);
        Ok(inbound.frame)
    }

    /// Reply to the request returned by the last [`recv`](Self::recv)
    pub fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let reply = self.pending.take().ok_or(TransportError::OutOfOrder(
            "send called without a pending request",
        ))?;
        if reply.send(frame).is_err() {
            // Peer disconnected after its request; the reply has nowhere to go
            debug!(endpoint = %self.endpoint, "peer gone before reply, discarding");
        }
        Ok(())
    }

    /// Receive and decode the next request
    pub fn recv_message<T: DeserializeOwned>(&mut self) -> Result<T, TransportError> {
        let frame = self.recv()?;
        codec::decode(&frame)
    }

    /// Encode and send the reply
    pub fn send_message<T: Serialize>(&mut self, msg: &T) -> Result<(), TransportError> {
        let frame = codec::encode(msg)?;
        self.send(frame)
    }
}

impl Drop for RepSocket {
    fn drop(&mut self) {
        drop(self.shutdown.take());

        // Requests that will never be answered release their peers
        self.pending = None;
        self.requests.close();
        while self.requests.try_recv().is_ok() {}

        let flushed = self
            .context
            .block_on(tokio::time::timeout(LINGER, &mut self.acceptor));
        if flushed.is_err() {
            warn!(endpoint = %self.endpoint, "replies still unwritten after linger, dropping them");
            self.acceptor.abort();
        }

        if let Some(path) = &self.socket_path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove socket file: {}", e),
            }
        }
        debug!(endpoint = %self.endpoint, "reply socket released");
    }
}

impl std::fmt::Debug for RepSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepSocket")
            .field("endpoint", &self.endpoint)
            .field("reply_pending", &self.pending.is_some())
            .finish()
    }
}

async fn accept_loop(
    listener: Listener,
    tx: mpsc::UnboundedSender<Inbound>,
    mut closing: watch::Receiver<()>,
    endpoint: Endpoint,
) {
    let mut peers = JoinSet::new();
    loop {
        tokio::select! {
            _ = closing.changed() => break,

            accepted = listener.accept() => match accepted {
                Ok(stream) => {
                    debug!(endpoint = %endpoint, "peer connected");
                    peers.spawn(serve_peer(stream, tx.clone(), closing.clone()));
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, "Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },

            // Reap finished peers so the set does not grow without bound
            Some(_) = peers.join_next(), if !peers.is_empty() => {}
        }
    }

    drop(listener);
    drop(tx);
    while peers.join_next().await.is_some() {}
    debug!(endpoint = %endpoint, "all peers finished");
}

async fn serve_peer(
    stream: PeerStream,
    tx: mpsc::UnboundedSender<Inbound>,
    mut closing: watch::Receiver<()>,
) {
    let (mut reader, mut writer) = tokio::io::split(stream);

    loop {
        // Only an idle peer is cut off; a reply in progress is always finished
        let read = tokio::select! {
            read = codec::read_frame(&mut reader) => read,
            _ = closing.changed() => return,
        };
        let frame = match read {
            Ok(frame) => frame,
            Err(TransportError::ConnectionClosed) => {
                debug!("peer disconnected");
                return;
            }
            Err(e) => {
                warn!("Failed to read request: {}", e);
                return;
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        if tx
            .send(Inbound {
                frame,
                reply: reply_tx,
            })
            .is_err()
        {
            return;
        }

        // Socket owner dropped without replying
        let Ok(reply) = reply_rx.await else {
            return;
        };

        if let Err(e) = codec::write_frame(&mut writer, &reply).await {
            debug!("Failed to write reply: {}", e);
            return;
        }
    }
}

#[cfg(test)]
#[path = "rep_tests.rs"]
mod tests;
