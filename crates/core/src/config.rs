// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `MW4S_*`
//! environment variables. Command-line flags are applied by the caller.
//!
//! ```toml
//! source = "tcp://10.0.0.5:5555"
//! sink = "ipc:///run/mw4s/sink.sock"
//! close_grace = "2s"
//! reconnect_interval = "250ms"
//! ```

use crate::endpoint::{Endpoint, EndpointError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default sink grace period before its socket is released
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(15);

/// Default delay between connection attempts to an unbound peer
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),

    #[error("Invalid config {}: {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),

    #[error("Invalid endpoint in {var}: {source}")]
    Endpoint {
        var: String,
        #[source]
        source: EndpointError,
    },

    #[error("Invalid value for {var}: '{value}' (expected milliseconds)")]
    Duration { var: String, value: String },
}

/// Addresses and timing shared by the source, sink and workers of one
/// deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Endpoint bound by the source
    pub source: Endpoint,
    /// Endpoint bound by the sink
    pub sink: Endpoint,
    /// How long the sink waits before releasing its socket on close
    #[serde(with = "humantime_serde")]
    pub close_grace: Duration,
    /// Delay between attempts to connect to a peer that is not bound yet
    #[serde(with = "humantime_serde")]
    pub reconnect_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Endpoint::tcp("127.0.0.1", 5555),
            sink: Endpoint::tcp("127.0.0.1", 5556),
            close_grace: DEFAULT_CLOSE_GRACE,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

impl Config {
    /// Config for the given endpoints with default timing
    pub fn new(source: Endpoint, sink: Endpoint) -> Self {
        Self {
            source,
            sink,
            ..Self::default()
        }
    }

    /// Set the sink grace period
    pub fn with_close_grace(mut self, close_grace: Duration) -> Self {
        self.close_grace = close_grace;
        self
    }

    /// Set the reconnect interval
    pub fn with_reconnect_interval(mut self, reconnect_interval: Duration) -> Self {
        self.reconnect_interval = reconnect_interval;
        self
    }

    /// Load a TOML config file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Apply `MW4S_SOURCE`, `MW4S_SINK`, `MW4S_CLOSE_GRACE_MS` and
    /// `MW4S_RECONNECT_MS` from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_vars(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("MW4S_SOURCE") {
            self.source = parse_endpoint("MW4S_SOURCE", &value)?;
        }
        if let Some(value) = lookup("MW4S_SINK") {
            self.sink = parse_endpoint("MW4S_SINK", &value)?;
        }
        if let Some(value) = lookup("MW4S_CLOSE_GRACE_MS") {
            self.close_grace = parse_duration_ms("MW4S_CLOSE_GRACE_MS", &value)?;
        }
        if let Some(value) = lookup("MW4S_RECONNECT_MS") {
            self.reconnect_interval = parse_duration_ms("MW4S_RECONNECT_MS", &value)?;
        }
        Ok(self)
    }
}

fn parse_endpoint(var: &str, value: &str) -> Result<Endpoint, ConfigError> {
    value.parse().map_err(|source| ConfigError::Endpoint {
        var: var.to_string(),
        source,
    })
}

fn parse_duration_ms(var: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::Duration {
            var: var.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
