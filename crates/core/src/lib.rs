// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mw4s-core: Protocol vocabulary for the MW4S pattern
//!
//! MW4S is Multiple Worker, Single Source, Single Sink. This crate provides:
//! - The closed message vocabulary exchanged between the three roles
//! - Endpoint addresses (`tcp://` and `ipc://`)
//! - Worker-count bookkeeping shared by the source and sink state machines
//! - Deployment configuration

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod count;
pub mod endpoint;
pub mod message;

pub use config::{Config, ConfigError};
pub use count::{CountError, WorkerCount};
pub use endpoint::{Endpoint, EndpointError};
pub use message::Message;
