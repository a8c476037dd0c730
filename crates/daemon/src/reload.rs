// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reload (§4.7): triggered by `HUP` or a `RELOAD` control request.
//!
//! Stops the metrics and remote-management listener groups, rereads the main
//! configuration file in place, rebinds both groups from the freshly loaded
//! ports, and re-arms them. The region's identity does not change — this
//! mutates the same [`crate::config::ConfigHandle`] the supervisor already
//! holds, so child tasks see the new values on their next read. Receivers
//! are not restarted by reload on the current contract (open item, see the
//! design notes on the dead-receiver and reload-respawn questions).

use std::sync::Arc;

use tracing::{error, info};

use crate::listener::group::ListenerGroup;
use crate::supervisor::Supervisor;

pub async fn perform(
    supervisor: &Arc<Supervisor>,
    metrics_group: &mut ListenerGroup,
    management_group: &mut ListenerGroup,
) {
    info!("reload requested, rereading configuration");

    if let Err(e) = supervisor.config.reload_main(&supervisor.config_path) {
        error!(error = ?e, path = %supervisor.config_path.display(), "reload failed to load configuration, keeping previous region");
        return;
    }

    let (metrics_port, management_port) = {
        let config = supervisor.config.read();
        (config.metrics_port, config.management_port)
    };

    if let Err(e) = metrics_group.rebind(metrics_port).await {
        error!(error = %e, "failed to rebind metrics listener group after reload");
    }
    if let Err(e) = management_group.rebind(management_port).await {
        error!(error = %e, "failed to rebind management listener group after reload");
    }

    info!("reload complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigHandle;
    use parking_lot::Mutex;
    use pgmoneta_collab::compression::NoopCompressor;
    use pgmoneta_collab::{
        MetricsExporter, NoopBackupEngine, NoopRemoteManagementHandler, NoopRetentionPolicy, NoopWalReceiver,
    };
    use pgmoneta_core::{PeriodicScheduler, SharedConfig, WorkerRegistry};
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    fn supervisor(config_path: std::path::PathBuf, config: SharedConfig) -> Supervisor {
        Supervisor {
            config: ConfigHandle::new(config),
            config_path,
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

    #[tokio::test]
    async fn reload_rebinds_metrics_group_to_new_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.conf");
        std::fs::write(&path, "host = \"127.0.0.1\"\nmetrics = 18401\n").unwrap();

        let config = SharedConfig::load_main(&path).unwrap();
        let sup = Arc::new(supervisor(path.clone(), config));

        let mut metrics_group = ListenerGroup::bind("metrics", "127.0.0.1", 18401).await.unwrap();
        let mut management_group = ListenerGroup::bind("management", "127.0.0.1", 0).await.unwrap();

        std::fs::write(&path, "host = \"127.0.0.1\"\nmetrics = 18402\n").unwrap();
        perform(&sup, &mut metrics_group, &mut management_group).await;

        assert_eq!(sup.config.read().metrics_port, 18402);
        assert!(metrics_group.is_enabled());

        tokio::net::TcpStream::connect("127.0.0.1:18402").await.unwrap();
    }

    #[tokio::test]
    async fn reload_with_unreadable_config_leaves_region_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.conf");
        std::fs::write(&path, "host = \"127.0.0.1\"\nmetrics = 18403\n").unwrap();

        let config = SharedConfig::load_main(&path).unwrap();
        let sup = Arc::new(supervisor(path.clone(), config));

        let mut metrics_group = ListenerGroup::bind("metrics", "127.0.0.1", 0).await.unwrap();
        let mut management_group = ListenerGroup::bind("management", "127.0.0.1", 0).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        perform(&sup, &mut metrics_group, &mut management_group).await;

        assert_eq!(sup.config.read().metrics_port, 18403);
    }
}
