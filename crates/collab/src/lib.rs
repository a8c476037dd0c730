// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! External collaborators invoked by the supervisor.
//!
//! None of these modules implement supervisor logic; each specifies a
//! narrow trait the daemon crate's lifecycle and dispatcher call through,
//! plus at least one concrete implementation. The backup algorithm, the WAL
//! streaming wire protocol, the retention policy's actual rules, gzip
//! framing, Prometheus text encoding, the remote-management interaction,
//! and the TLS handshake all live here precisely because they are
//! independently replaceable behind these narrow interfaces.

pub mod backup;
pub mod compression;
pub mod hot_standby;
pub mod management;
pub mod metrics;
pub mod retention;
pub mod tls;
pub mod wal_receiver;

pub use backup::{BackupEngine, BackupOutcome, NoopBackupEngine};
pub use compression::{GzipCompressor, NoopCompressor, WalCompressor};
pub use hot_standby::HotStandbyMirror;
pub use management::{NoopRemoteManagementHandler, RemoteManagementHandler};
pub use metrics::MetricsExporter;
pub use retention::{NoopRetentionPolicy, RetentionPolicy};
pub use tls::TlsValidator;
pub use wal_receiver::{NoopWalReceiver, WalReceiver};
