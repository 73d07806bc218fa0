// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint addresses
//!
//! A deployment is defined by two endpoints: the one the source binds and the
//! one the sink binds. Both are written as URLs:
//!
//! - `tcp://host:port` (a bare `host:port` is accepted as TCP)
//! - `ipc:///path/to/socket` for Unix domain sockets

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing an endpoint address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("empty endpoint address")]
    Empty,

    #[error("unsupported endpoint scheme '{0}' (expected tcp:// or ipc://)")]
    UnsupportedScheme(String),

    #[error("invalid tcp endpoint '{0}': expected host:port")]
    InvalidTcp(String),

    #[error("invalid ipc endpoint '{0}': expected a socket path")]
    InvalidIpc(String),
}

/// Address of a bound or connectable endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    /// TCP `host:port`
    Tcp(String),
    /// Unix domain socket path
    Ipc(PathBuf),
}

impl Endpoint {
    /// TCP endpoint on `host:port`
    pub fn tcp(host: &str, port: u16) -> Self {
        Endpoint::Tcp(format!("{}:{}", host, port))
    }

    /// Unix domain socket endpoint
    pub fn ipc(path: impl Into<PathBuf>) -> Self {
        Endpoint::Ipc(path.into())
    }

    /// Loopback TCP endpoint on an OS-assigned port
    pub fn any_local_port() -> Self {
        Self::tcp("127.0.0.1", 0)
    }

    /// Socket path for IPC endpoints
    pub fn path(&self) -> Option<&Path> {
        match self {
            Endpoint::Ipc(path) => Some(path),
            Endpoint::Tcp(_) => None,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
            Endpoint::Ipc(path) => write!(f, "ipc://{}", path.display()),
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EndpointError::Empty);
        }

        match s.split_once("://") {
            Some(("tcp", addr)) => parse_tcp(addr),
            Some(("ipc", path)) => {
                if path.is_empty() {
                    return Err(EndpointError::InvalidIpc(s.to_string()));
                }
                Ok(Endpoint::Ipc(PathBuf::from(path)))
            }
            Some((scheme, _)) => Err(EndpointError::UnsupportedScheme(scheme.to_string())),
            None => parse_tcp(s),
        }
    }
}

fn parse_tcp(addr: &str) -> Result<Endpoint, EndpointError> {
    // rsplit so bracketed IPv6 hosts keep their colons
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| EndpointError::InvalidTcp(addr.to_string()))?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(EndpointError::InvalidTcp(addr.to_string()));
    }
    Ok(Endpoint::Tcp(addr.to_string()))
}

impl TryFrom<String> for Endpoint {
    type Error = EndpointError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
