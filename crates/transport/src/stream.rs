// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener and stream plumbing over TCP and Unix domain sockets

use mw4s_core::Endpoint;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};

/// Byte stream to a peer, regardless of socket family
pub(crate) trait PeerIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> PeerIo for T {}

pub(crate) type PeerStream = Box<dyn PeerIo>;

/// Bound listener for a reply socket
pub(crate) enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl Listener {
    /// Bind the endpoint, returning the listener and the resolved endpoint
    /// (TCP port 0 is replaced by the assigned port)
    pub(crate) async fn bind(endpoint: &Endpoint) -> io::Result<(Self, Endpoint)> {
        match endpoint {
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str()).await?;
                let local = listener.local_addr()?;
                Ok((Listener::Tcp(listener), Endpoint::Tcp(local.to_string())))
            }
            Endpoint::Ipc(path) => {
                let listener = UnixListener::bind(path)?;
                Ok((Listener::Unix(listener), endpoint.clone()))
            }
        }
    }

    pub(crate) async fn accept(&self) -> io::Result<PeerStream> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, _) = listener.accept().await?;
                stream.set_nodelay(true)?;
                Ok(Box::new(stream))
            }
            Listener::Unix(listener) => {
                let (stream, _) = listener.accept().await?;
                Ok(Box::new(stream))
            }
        }
    }
}

/// Open a connection to an endpoint
pub(crate) async fn connect(endpoint: &Endpoint) -> io::Result<PeerStream> {
    match endpoint {
        Endpoint::Tcp(addr) => {
            let stream = TcpStream::connect(addr.as_str()).await?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream))
        }
        Endpoint::Ipc(path) => Ok(Box::new(UnixStream::connect(path).await?)),
    }
}

/// Connect errors that mean the peer is not bound yet
pub(crate) fn is_not_ready(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NotFound
            | io::ErrorKind::ConnectionReset
    )
}
