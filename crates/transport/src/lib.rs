// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mw4s-transport: Synchronous request/reply sockets
//!
//! Two socket roles with strict send/receive alternation:
//! - [`RepSocket`] binds an endpoint and serves requests from any number of
//!   connected peers, one at a time, in arrival order
//! - [`ReqSocket`] connects to an endpoint and exchanges exactly one reply per
//!   request
//!
//! Every call blocks the calling thread. Socket I/O runs on a [`Context`], a
//! dedicated runtime shared by all sockets of the process.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod codec;
mod context;
mod error;
mod rep;
mod req;
mod stream;

pub use context::Context;
pub use error::TransportError;
pub use rep::RepSocket;
pub use req::ReqSocket;
