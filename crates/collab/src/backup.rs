// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup workflow collaborator, invoked by the `BACKUP` and `DELETE`
//! control-request handlers. The on-disk backup layout is explicitly out of
//! scope here; this trait only fixes the shape the dispatcher needs.

use async_trait::async_trait;
use pgmoneta_core::ServerEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    pub backup_id: String,
    pub success: bool,
}

#[async_trait]
pub trait BackupEngine: Send + Sync {
    /// Run a full backup of `server`, returning once the backup either
    /// completes or fails. Called from the one-shot task spawned for a
    /// `BACKUP` request; there is no reply path for this request on the
    /// current contract, so errors are the caller's responsibility to log.
    async fn run_backup(&self, server: &ServerEntry) -> BackupOutcome;

    /// List known backup identifiers for `server`, oldest first.
    async fn list_backups(&self, server: &ServerEntry) -> Vec<String>;

    /// Delete `backup_id` from `server`. Returns `0` on success and a
    /// non-zero result code otherwise, matching the `{server_index,
    /// result}` reply shape.
    async fn delete_backup(&self, server: &ServerEntry, backup_id: &str) -> i32;
}

/// Minimal engine that records nothing on disk; useful as the default when
/// no real backup backend is wired up, and in tests of the dispatcher that
/// do not care about backup semantics.
#[derive(Debug, Default)]
pub struct NoopBackupEngine;

#[async_trait]
impl BackupEngine for NoopBackupEngine {
    async fn run_backup(&self, _server: &ServerEntry) -> BackupOutcome {
        BackupOutcome {
            backup_id: "0".to_string(),
            success: true,
        }
    }

    async fn list_backups(&self, _server: &ServerEntry) -> Vec<String> {
        Vec::new()
    }

    async fn delete_backup(&self, _server: &ServerEntry, _backup_id: &str) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerEntry {
        ServerEntry {
            name: "a".into(),
            host: "127.0.0.1".into(),
            port: 5432,
            username: "repl".into(),
            hot_standby: String::new(),
            workers: 0,
        }
    }

    #[tokio::test]
    async fn noop_engine_lists_nothing() {
        let engine = NoopBackupEngine;
        assert!(engine.list_backups(&server()).await.is_empty());
    }

    #[tokio::test]
    async fn noop_engine_delete_succeeds() {
        let engine = NoopBackupEngine;
        assert_eq!(engine.delete_backup(&server(), "1").await, 0);
    }
}
