// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control Dispatcher: interprets one framed request from the control
//! channel and acts on it. Heavy kinds (`BACKUP`, `LIST_BACKUP`, `DELETE`)
//! are handed to a spawned task against the still-open connection; the
//! rest run inline on the caller's task, which is the supervisor's own
//! accept loop.

use std::sync::Arc;

use pgmoneta_collab::{BackupEngine, RetentionPolicy, WalCompressor};
use pgmoneta_core::protocol::{ControlKind, ControlRequest, ControlResponse};
use pgmoneta_core::wire;
use tokio::net::UnixStream;
use tracing::{info, warn};

use crate::supervisor::Supervisor;

pub async fn handle_connection(supervisor: Arc<Supervisor>, mut stream: UnixStream) {
    let request = match wire::read_request(&mut stream).await {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "malformed control request");
            return;
        }
    };

    if request.kind == ControlKind::Backup {
        handle_backup(supervisor, request);
    } else if request.kind.is_heavy() {
        tokio::spawn(handle_heavy(supervisor, stream, request));
    } else {
        handle_light(&supervisor, &mut stream, request).await;
    }
}

/// `BACKUP`: resolve the server on the caller's own task before forking
/// anything. An unknown server is logged and dropped with no child
/// spawned, per the control dispatcher contract.
fn handle_backup(supervisor: Arc<Supervisor>, request: ControlRequest) {
    let Some(name) = request.server_name() else { return };
    let Some(server) = supervisor.find_server(name) else {
        info!("Backup: Unknown server {name}");
        return;
    };

    tokio::spawn(async move {
        // No reply path for BACKUP on the current contract.
        let _ = supervisor.backup_engine.run_backup(&server).await;
    });
}

async fn handle_heavy(supervisor: Arc<Supervisor>, mut stream: UnixStream, request: ControlRequest) {
    match request.kind {
        ControlKind::ListBackup => {
            let Some(name) = request.server_name() else { return };
            let backups = match supervisor.find_server(name) {
                Some(server) => supervisor.backup_engine.list_backups(&server).await,
                None => Vec::new(),
            };
            let _ = wire::write_response(&mut stream, &ControlResponse::ListBackup { backups }).await;
        }
        ControlKind::Delete => {
            let (Some(name), Some(backup_id)) = (request.server_name(), request.backup_id()) else {
                return;
            };
            let (server_index, result) = match supervisor.find_server_indexed(name) {
                Some((idx, server)) => {
                    let result = supervisor.backup_engine.delete_backup(&server, backup_id).await;
                    (idx as i32, result)
                }
                None => (-1, 1),
            };
            let _ = wire::write_response(
                &mut stream,
                &ControlResponse::Delete { server_index, result },
            )
            .await;
        }
        _ => unreachable!("handle_heavy only receives ListBackup/Delete; Backup is handled before spawning"),
    }
}

async fn handle_light(supervisor: &Arc<Supervisor>, stream: &mut UnixStream, request: ControlRequest) {
    match request.kind {
        ControlKind::Stop => {
            supervisor.keep_running.store(false, std::sync::atomic::Ordering::SeqCst);
            supervisor.shutdown_notify.notify_one();
        }
        ControlKind::Status => {
            let config = supervisor.config.read();
            let resp = ControlResponse::Status {
                servers_up: supervisor.registry.lock().len(),
                retention_armed: true,
                compression_armed: supervisor.scheduler.wal_compression.is_some(),
            };
            drop(config);
            let _ = wire::write_response(stream, &resp).await;
        }
        ControlKind::Details => {
            let config = supervisor.config.read();
            let servers = config.servers.iter().map(|s| s.name.clone()).collect();
            drop(config);
            let _ = wire::write_response(stream, &ControlResponse::Details { servers }).await;
        }
        ControlKind::IsAlive => {
            let _ = wire::write_response(stream, &ControlResponse::IsAlive { alive: true }).await;
        }
        ControlKind::Reset => {
            supervisor.metrics.reset();
            let _ = wire::write_response(stream, &ControlResponse::Ack).await;
        }
        ControlKind::Reload => {
            supervisor.request_reload();
            let _ = wire::write_response(stream, &ControlResponse::Ack).await;
        }
        ControlKind::Backup | ControlKind::ListBackup | ControlKind::Delete => {
            unreachable!("handle_light only receives non-heavy kinds")
        }
    }
}

/// Used by the periodic scheduler: compress every closed segment under
/// `<base>/<server>/wal/` for every configured server.
pub async fn run_compression_sweep(supervisor: &Supervisor) {
    let servers = supervisor.config.read().servers.clone();
    for server in servers {
        let wal_dir = supervisor.config.read().base_dir.join(&server.name).join("wal");
        let Ok(entries) = std::fs::read_dir(&wal_dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("gz") {
                continue;
            }
            let dst = path.with_extension("gz");
            if let Err(e) = supervisor.compressor.compress_file(&path, &dst).await {
                warn!(server = %server.name, path = %path.display(), error = %e, "compression sweep failed");
            }
        }
    }
}

/// Used by the periodic scheduler: apply the retention policy across all
/// configured servers.
pub async fn run_retention_sweep(supervisor: &Supervisor) {
    let servers = supervisor.config.read().servers.clone();
    for server in servers {
        let removed = supervisor.retention.apply(&server).await;
        if !removed.is_empty() {
            info!(server = %server.name, removed = removed.len(), "retention sweep removed backups");
        }
    }
}
