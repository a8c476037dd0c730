// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control channel request/response types.
//!
//! Requests follow the wire framing fixed by the control channel contract:
//! `kind:i8, n_slots:i32 (BE), (len:i32 BE, bytes[len])^n_slots`. Replies are
//! not pinned to a specific wire shape by that contract, so they are framed
//! as a single length-prefixed JSON document (see [`crate::wire`]), in the
//! same style the length-prefixed framing already used elsewhere favors.

use serde::{Deserialize, Serialize};

use crate::error::PgmonetaError;

/// The single-byte kind tag on the wire. Discriminants are part of the
/// contract: do not renumber without also updating every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ControlKind {
    Backup = 0,
    ListBackup = 1,
    Delete = 2,
    Stop = 3,
    Status = 4,
    Details = 5,
    IsAlive = 6,
    Reset = 7,
    Reload = 8,
}

impl ControlKind {
    pub fn from_i8(v: i8) -> Option<Self> {
        Some(match v {
            0 => ControlKind::Backup,
            1 => ControlKind::ListBackup,
            2 => ControlKind::Delete,
            3 => ControlKind::Stop,
            4 => ControlKind::Status,
            5 => ControlKind::Details,
            6 => ControlKind::IsAlive,
            7 => ControlKind::Reset,
            8 => ControlKind::Reload,
            _ => return None,
        })
    }

    /// Exact slot count this kind is defined to carry. Anything else is a
    /// malformed request.
    pub fn expected_slots(self) -> usize {
        match self {
            ControlKind::Backup => 1,
            ControlKind::ListBackup => 1,
            ControlKind::Delete => 2,
            ControlKind::Stop
            | ControlKind::Status
            | ControlKind::Details
            | ControlKind::IsAlive
            | ControlKind::Reset
            | ControlKind::Reload => 0,
        }
    }

    /// Whether handling this kind forks/spawns a one-shot worker rather
    /// than running inline on the supervisor's own task.
    pub fn is_heavy(self) -> bool {
        matches!(self, ControlKind::Backup | ControlKind::ListBackup | ControlKind::Delete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub kind: ControlKind,
    pub slots: Vec<String>,
}

impl ControlRequest {
    pub fn parse(kind_byte: i8, slots: Vec<String>) -> Result<Self, PgmonetaError> {
        let kind = ControlKind::from_i8(kind_byte).ok_or(PgmonetaError::WireMalformed)?;
        if slots.len() != kind.expected_slots() {
            return Err(PgmonetaError::WireMalformed);
        }
        Ok(ControlRequest { kind, slots })
    }

    pub fn server_name(&self) -> Option<&str> {
        self.slots.first().map(String::as_str)
    }

    pub fn backup_id(&self) -> Option<&str> {
        self.slots.get(1).map(String::as_str)
    }
}

/// Structured reply. `BACKUP` has no reply on the current contract: the
/// dispatcher simply does not write one for that kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlResponse {
    ListBackup { backups: Vec<String> },
    Delete { server_index: i32, result: i32 },
    Status { servers_up: usize, retention_armed: bool, compression_armed: bool },
    Details { servers: Vec<String> },
    IsAlive { alive: bool },
    Ack,
}
