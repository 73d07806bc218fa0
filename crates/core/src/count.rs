// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live-worker bookkeeping
//!
//! The source and the sink each keep their own count of registered workers.
//! The two counts are never shared; they converge once no join or exit is in
//! flight.

use thiserror::Error;

/// Errors from worker-count updates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountError {
    #[error("worker exited without a matching join")]
    Unregistered,
}

/// Number of workers currently registered with an endpoint.
///
/// Never negative: an exit with no live workers is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub fn new() -> Self {
        Self(0)
    }

    /// Register a worker, returning the new count
    pub fn join(&mut self) -> usize {
        self.0 += 1;
        self.0
    }

    /// Deregister a worker, returning the new count
    pub fn exit(&mut self) -> Result<usize, CountError> {
        self.0 = self.0.checked_sub(1).ok_or(CountError::Unregistered)?;
        Ok(self.0)
    }

    pub fn get(&self) -> usize {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "count_tests.rs"]
mod tests;
