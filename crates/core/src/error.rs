// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the supervisor and its collaborators.
//!
//! Variant names mirror the error kinds a fatal-vs-recoverable classification
//! is built on: every kind except [`PgmonetaError::AcceptTransient`] is fatal
//! during startup (see [`PgmonetaError::fatal_at_startup`]).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgmonetaError {
    #[error("Configuration not found: {0}")]
    ConfigMissing(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("{kind}: Too many defined {count} (max {max})")]
    CapacityExceeded {
        kind: &'static str,
        count: usize,
        max: usize,
    },

    #[error("Invalid master key file")]
    BadMasterKey,

    #[error("Could not bind to {0}")]
    BindFailed(String),

    #[error("Could not spawn worker: {0}")]
    SpawnFailed(String),

    #[error("transient accept error: {0}")]
    AcceptTransient(#[source] std::io::Error),

    #[error("fatal accept error: {0}")]
    AcceptFatal(#[source] std::io::Error),

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("malformed control request")]
    WireMalformed,

    #[error("PID file already exists: {0}")]
    PidfileExists(PathBuf),

    #[error("Invalid TLS configuration: {0}")]
    TlsInvalid(String),

    #[error("internal error: {0}")]
    InternalBug(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PgmonetaError {
    /// During startup every kind except a transient accept error aborts the
    /// process; the listener set never observes accept errors before it has
    /// bound, so in practice this only excludes events that cannot occur yet.
    pub fn fatal_at_startup(&self) -> bool {
        !matches!(self, PgmonetaError::AcceptTransient(_))
    }
}

/// Outcome of loading one of the three configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLoadResult {
    Ok,
    Missing,
    BadMasterKey,
    CapacityExceeded,
}

impl ConfigLoadResult {
    pub fn is_fatal(self) -> bool {
        !matches!(self, ConfigLoadResult::Ok)
    }
}
