// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Supervisor` value: everything the original kept as global
//! singletons (`shmem`, `main_loop`, `keep_running`, listener arrays)
//! re-modeled as fields on one value owned by the entry point and passed
//! to handlers by reference, per the design notes' recommendation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pgmoneta_collab::{
    BackupEngine, MetricsExporter, RemoteManagementHandler, RetentionPolicy, WalCompressor, WalReceiver,
};
use pgmoneta_core::{PeriodicScheduler, ServerEntry, WorkerRegistry};
use tokio::sync::Notify;

use crate::config::ConfigHandle;

pub struct Supervisor {
    pub config: ConfigHandle,
    /// Path the region's main configuration file was loaded from, kept
    /// around so `RELOAD` can re-read from the same place.
    pub config_path: PathBuf,
    pub registry: Arc<Mutex<WorkerRegistry>>,
    pub scheduler: PeriodicScheduler,
    pub metrics: Arc<MetricsExporter>,
    pub backup_engine: Arc<dyn BackupEngine>,
    pub wal_receiver: Arc<dyn WalReceiver>,
    pub compressor: Arc<dyn WalCompressor>,
    pub retention: Arc<dyn RetentionPolicy>,
    pub management_handler: Arc<dyn RemoteManagementHandler>,
    pub keep_running: AtomicBool,
    pub shutdown_notify: Notify,
    pub reload_requested: AtomicBool,
}

impl Supervisor {
    /// Resolve a server by exact, case-sensitive name. First hit wins;
    /// duplicate names are a misconfiguration the region's `validate`
    /// step is expected to have already rejected.
    pub fn find_server(&self, name: &str) -> Option<ServerEntry> {
        self.config.read().servers.iter().find(|s| s.name == name).cloned()
    }

    pub fn find_server_indexed(&self, name: &str) -> Option<(usize, ServerEntry)> {
        self.config
            .read()
            .servers
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
            .map(|(i, s)| (i, s.clone()))
    }

    pub fn request_reload(&self) {
        self.reload_requested.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.keep_running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgmoneta_collab::{NoopBackupEngine, NoopRemoteManagementHandler, NoopRetentionPolicy, NoopWalReceiver};
    use pgmoneta_collab::compression::NoopCompressor;
    use pgmoneta_core::SharedConfig;

    fn test_supervisor() -> Supervisor {
        let mut config = SharedConfig::default();
        config.servers.push(ServerEntry {
            name: "a".into(),
            host: "h".into(),
            port: 1,
            username: "u".into(),
            hot_standby: String::new(),
            workers: 0,
        });

        Supervisor {
            config: ConfigHandle::new(config),
            config_path: PathBuf::from("pgmoneta.conf"),
            registry: Arc::new(Mutex::new(WorkerRegistry::new())),
            scheduler: PeriodicScheduler::new(false),
            metrics: MetricsExporter::new(),
            backup_engine: Arc::new(NoopBackupEngine),
            wal_receiver: Arc::new(NoopWalReceiver),
            compressor: Arc::new(NoopCompressor),
            retention: Arc::new(NoopRetentionPolicy),
            management_handler: Arc::new(NoopRemoteManagementHandler),
            keep_running: AtomicBool::new(true),
            shutdown_notify: Notify::new(),
            reload_requested: AtomicBool::new(false),
        }
    }

    #[test]
    fn find_server_exact_match_only() {
        let supervisor = test_supervisor();
        assert!(supervisor.find_server("a").is_some());
        assert!(supervisor.find_server("A").is_none());
        assert!(supervisor.find_server("ghost").is_none());
    }

    #[test]
    fn request_reload_sets_flag() {
        let supervisor = test_supervisor();
        assert!(!supervisor.reload_requested.load(Ordering::SeqCst));
        supervisor.request_reload();
        assert!(supervisor.reload_requested.load(Ordering::SeqCst));
    }
}
