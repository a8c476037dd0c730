// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shared domain types for the supervisor: configuration region, server and
//! credential records, the control-channel protocol and wire framing, the
//! worker registry, the periodic scheduler, accept-error classification,
//! and the error taxonomy. The daemon and CLI crates build on top of these.

pub mod accept;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod wire;

pub use config::{peek_log_settings, CompressionPolicy, LogType, MultiplexerBackend, SharedConfig};
pub use error::{ConfigLoadResult, PgmonetaError};
pub use protocol::{ControlKind, ControlRequest, ControlResponse};
pub use registry::{WorkerHandle, WorkerRegistry};
pub use scheduler::{PeriodicScheduler, PeriodicTask};
pub use server::{AdminCredential, ServerEntry, UserCredential, MAX_ADMINS, MAX_SERVERS, MAX_USERS};

/// Well-known file name of the local control socket, created under the
/// region's `unix_socket_dir`. Shared between the daemon (which binds it)
/// and the CLI (which connects to it), so it lives here rather than in
/// either crate.
pub const CONTROL_SOCKET_NAME: &str = "pgmoneta.sock";
