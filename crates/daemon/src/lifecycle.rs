// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle Controller: the ordered startup pipeline and its strict
//! teardown in reverse, per the contract in §4.1 of the design this
//! follows. Each step either succeeds or the whole pipeline is abandoned;
//! on abandonment a single line is printed for the operator and, when a
//! compatible init system is present, it is told the process failed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pgmoneta_collab::{
    BackupEngine, GzipCompressor, MetricsExporter, NoopBackupEngine, NoopCompressor, NoopRemoteManagementHandler,
    NoopRetentionPolicy, NoopWalReceiver, RemoteManagementHandler, RetentionPolicy, WalCompressor, WalReceiver,
};
use pgmoneta_core::{CompressionPolicy, ConfigLoadResult, PeriodicScheduler, PgmonetaError, SharedConfig, WorkerRegistry};
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::config::ConfigHandle;
use crate::dispatch;
use crate::listener::group::ListenerGroup;
use crate::pidfile::PidFile;
use crate::proctitle;
use crate::sd_notify::Notifier;
use crate::signals::{SignalDispatcher, SupervisorEvent};
use crate::supervisor::Supervisor;

pub const APP_NAME: &str = "pgmoneta";

pub struct StartupOptions {
    pub config_path: PathBuf,
    pub users_path: PathBuf,
    pub admins_path: PathBuf,
    pub daemonize: bool,
}

impl StartupOptions {
    pub fn defaults() -> Self {
        StartupOptions {
            config_path: PathBuf::from(format!("/etc/{APP_NAME}/{APP_NAME}.conf")),
            users_path: PathBuf::from(format!("/etc/{APP_NAME}/{APP_NAME}_users.conf")),
            admins_path: PathBuf::from(format!("/etc/{APP_NAME}/{APP_NAME}_admins.conf")),
            daemonize: false,
        }
    }
}

/// Refuse to run as the privileged user, matching step 1 of the startup
/// pipeline.
#[cfg(unix)]
pub fn refuse_root() -> Result<(), String> {
    if nix::unistd::Uid::effective().is_root() {
        return Err("Using the root account is not allowed".to_string());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn refuse_root() -> Result<(), String> {
    Ok(())
}

/// Run the full startup pipeline, the event loop, and teardown. Returns
/// `Ok(())` on a clean shutdown (`STOP`/`TERM`/`INT`) and `Err` with a
/// message already suitable to print to the operator on any startup
/// failure.
pub async fn run(options: StartupOptions) -> Result<(), String> {
    refuse_root()?;

    // Step 2: load the three configuration files.
    let mut config = match SharedConfig::load_main(&options.config_path) {
        Ok(c) => c,
        Err(ConfigLoadResult::Missing) => {
            return Err(format!("Configuration not found: {}", options.config_path.display()));
        }
        Err(ConfigLoadResult::CapacityExceeded) => {
            return Err("Too many defined servers".to_string());
        }
        Err(ConfigLoadResult::BadMasterKey) => {
            return Err("Invalid master key file".to_string());
        }
        Err(ConfigLoadResult::Ok) => unreachable!(),
    };

    if options.users_path.exists() {
        let result = config.load_users(&options.users_path);
        if result.is_fatal() && result != ConfigLoadResult::Missing {
            return Err(describe_load_failure("users", result));
        }
    }
    if options.admins_path.exists() {
        let result = config.load_admins(&options.admins_path);
        if result.is_fatal() && result != ConfigLoadResult::Missing {
            return Err(describe_load_failure("admins", result));
        }
    }

    // Step 3: logging is initialized by the caller (main.rs) before this
    // pipeline runs, so that even step-1/2 failures are logged uniformly.
    config.validate().map_err(|e| e.to_string())?;

    // Step 4: daemonize if requested.
    if options.daemonize {
        if config.log_type == pgmoneta_core::LogType::Console {
            return Err("Daemon mode can't be used with console logging".to_string());
        }
        daemonize::Daemonize::new()
            .start()
            .map_err(|e| format!("failed to daemonize: {e}"))?;
    }

    // Step 5: PID file, exclusive creation.
    let pidfile = PidFile::create(&config.pid_file).map_err(|e| e.to_string())?;

    // Step 6: process title.
    proctitle::set_main_title(APP_NAME);

    // Step 7: bind the control socket and arm signal watchers.
    std::fs::create_dir_all(&config.unix_socket_dir).map_err(|e| e.to_string())?;
    let control_path = config.unix_socket_dir.join(pgmoneta_core::CONTROL_SOCKET_NAME);
    let _ = std::fs::remove_file(&control_path);
    let control_listener =
        UnixListener::bind(&control_path).map_err(|e| format!("Could not bind to {}: {e}", control_path.display()))?;

    let mut signal_dispatcher = SignalDispatcher::install().map_err(|e| e.to_string())?;

    // Step 8: TLS material validation is skipped here when the region has
    // no TLS paths configured; a deployment that needs it wires
    // `pgmoneta_collab::tls::TlsValidator::validate` in before step 9.

    // Step 9: metrics and remote-management listener groups.
    let mut metrics_group = ListenerGroup::bind("metrics", &config.host.clone(), config.metrics_port)
        .await
        .map_err(|e| e.to_string())?;
    let mut management_group = ListenerGroup::bind("management", &config.host.clone(), config.management_port)
        .await
        .map_err(|e| e.to_string())?;

    // Step 10: one receiver per configured server, plus the periodic watchers.
    let compressor: Arc<dyn WalCompressor> = match config.compression {
        CompressionPolicy::None => Arc::new(NoopCompressor),
        CompressionPolicy::Gzip => Arc::new(GzipCompressor),
    };
    let scheduler = PeriodicScheduler::new(config.compression != CompressionPolicy::None);

    let backup_engine: Arc<dyn BackupEngine> = Arc::new(NoopBackupEngine);
    let wal_receiver: Arc<dyn WalReceiver> = Arc::new(NoopWalReceiver);
    let retention: Arc<dyn RetentionPolicy> = Arc::new(NoopRetentionPolicy);
    let management_handler: Arc<dyn RemoteManagementHandler> = Arc::new(NoopRemoteManagementHandler);

    let registry = Arc::new(Mutex::new(WorkerRegistry::new()));
    let config_handle = ConfigHandle::new(config);

    let supervisor = Arc::new(Supervisor {
        config: config_handle,
        config_path: options.config_path.clone(),
        registry: registry.clone(),
        scheduler,
        metrics: MetricsExporter::new(),
        backup_engine,
        wal_receiver,
        compressor,
        retention,
        management_handler,
        keep_running: AtomicBool::new(true),
        shutdown_notify: Notify::new(),
        reload_requested: AtomicBool::new(false),
    });

    spawn_receivers(&supervisor);

    // Step 11: signal readiness and enter the event loop.
    let notifier = Notifier::from_env();
    notifier.ready();
    info!("pgmoneta is ready");

    run_event_loop(
        &supervisor,
        &control_listener,
        &mut metrics_group,
        &mut management_group,
        &mut signal_dispatcher,
        &notifier,
    )
    .await;

    // Teardown, strict reverse order: remote management, then metrics,
    // then the control socket.
    notifier.stopping();
    management_group.stop();
    metrics_group.stop();
    registry.lock().stop_all();
    let _ = std::fs::remove_file(&control_path);
    pidfile.remove().map_err(|e| e.to_string())?;

    Ok(())
}

fn describe_load_failure(which: &str, result: ConfigLoadResult) -> String {
    match result {
        ConfigLoadResult::BadMasterKey => format!("Invalid master key file for {which}"),
        ConfigLoadResult::CapacityExceeded => format!("Too many defined entries in {which}"),
        ConfigLoadResult::Missing => format!("{which} configuration not found"),
        ConfigLoadResult::Ok => unreachable!(),
    }
}

fn spawn_receivers(supervisor: &Arc<Supervisor>) {
    let servers = supervisor.config.read().servers.clone();
    let mut registry = supervisor.registry.lock();
    for (index, server) in servers.into_iter().enumerate() {
        let shutdown = Arc::new(Notify::new());
        let receiver = supervisor.wal_receiver.clone();
        let shutdown_clone = shutdown.clone();
        let join = tokio::spawn(async move { receiver.stream(server, shutdown_clone).await });
        registry.add(pgmoneta_core::WorkerHandle {
            server_index: index,
            join,
            shutdown,
        });
    }
}

/// Which listener group accepted a connection, so [`handle_group_accept`]
/// knows which one-shot task to spawn on a successful accept.
#[derive(Clone, Copy)]
enum GroupKind {
    Metrics,
    Management,
}

#[allow(clippy::too_many_arguments)]
async fn run_event_loop(
    supervisor: &Arc<Supervisor>,
    control_listener: &UnixListener,
    metrics_group: &mut ListenerGroup,
    management_group: &mut ListenerGroup,
    signals: &mut SignalDispatcher,
    notifier: &Notifier,
) {
    let mut compression_tick = tokio::time::interval(pgmoneta_core::scheduler::PERIODIC_INTERVAL);
    let mut retention_tick = tokio::time::interval(pgmoneta_core::scheduler::PERIODIC_INTERVAL);

    loop {
        if !supervisor.is_running() {
            break;
        }

        tokio::select! {
            accepted = control_listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let sup = supervisor.clone();
                        tokio::spawn(handle_control(sup, stream));
                    }
                    Err(e) => warn!(error = %e, "control listener accept error"),
                }
            }
            result = metrics_group.accept(), if metrics_group.is_enabled() => {
                handle_group_accept(supervisor, metrics_group, GroupKind::Metrics, result, config_port(supervisor, |c| c.metrics_port)).await;
            }
            result = management_group.accept(), if management_group.is_enabled() => {
                handle_group_accept(supervisor, management_group, GroupKind::Management, result, config_port(supervisor, |c| c.management_port)).await;
            }
            event = signals.next() => {
                match event {
                    SupervisorEvent::Terminate | SupervisorEvent::Interrupt => {
                        info!("shutdown signal received");
                        supervisor.keep_running.store(false, Ordering::SeqCst);
                    }
                    SupervisorEvent::Alarm => {
                        info!("alarm signal received");
                        supervisor.keep_running.store(false, Ordering::SeqCst);
                    }
                    SupervisorEvent::Reload => {
                        crate::reload::perform(supervisor, metrics_group, management_group).await;
                    }
                    SupervisorEvent::Abort => {
                        error!("abort signal received");
                        std::process::abort();
                    }
                }
            }
            _ = compression_tick.tick(), if supervisor.scheduler.wal_compression.is_some() => {
                if let Some(task) = supervisor.scheduler.wal_compression.as_ref() {
                    if let Some(guard) = task.try_begin_tick() {
                        let sup = supervisor.clone();
                        tokio::spawn(async move {
                            dispatch::run_compression_sweep(&sup).await;
                            drop(guard);
                        });
                    } else {
                        warn!("compression sweep still running, skipping this tick");
                    }
                }
            }
            _ = retention_tick.tick() => {
                if let Some(guard) = supervisor.scheduler.retention.try_begin_tick() {
                    let sup = supervisor.clone();
                    tokio::spawn(async move {
                        dispatch::run_retention_sweep(&sup).await;
                        drop(guard);
                    });
                } else {
                    warn!("retention sweep still running, skipping this tick");
                }
            }
            _ = supervisor.shutdown_notify.notified() => {
                if supervisor.reload_requested.swap(false, Ordering::SeqCst) {
                    crate::reload::perform(supervisor, metrics_group, management_group).await;
                }
                notifier.status(if supervisor.is_running() { "running" } else { "stopping" });
            }
        }
    }
}

fn config_port(supervisor: &Arc<Supervisor>, pick: impl Fn(&SharedConfig) -> u16) -> u16 {
    pick(&supervisor.config.read())
}

async fn handle_group_accept(
    supervisor: &Arc<Supervisor>,
    group: &mut ListenerGroup,
    kind: GroupKind,
    result: Result<(tokio::net::TcpStream, std::net::SocketAddr), PgmonetaError>,
    current_port: u16,
) {
    match result {
        Ok((stream, peer)) => {
            info!(group = group.label(), %peer, "accepted connection");
            match kind {
                GroupKind::Metrics => {
                    let metrics = supervisor.metrics.clone();
                    tokio::spawn(async move {
                        if let Err(e) = write_metrics_response(stream, &metrics).await {
                            warn!(%peer, error = %e, "failed to write metrics scrape response");
                        }
                    });
                }
                GroupKind::Management => {
                    let handler = supervisor.management_handler.clone();
                    tokio::spawn(async move { handler.handle(stream, peer).await });
                }
            }
        }
        Err(PgmonetaError::AcceptTransient(e)) => {
            warn!(group = group.label(), error = %e, "transient accept error");
        }
        Err(PgmonetaError::AcceptFatal(e)) => {
            error!(group = group.label(), error = %e, "fatal accept error, rebinding");
            if !supervisor.is_running() {
                return;
            }
            if let Err(e) = group.rebind(current_port).await {
                error!(group = group.label(), error = %e, "rebind failed, exiting");
                supervisor.keep_running.store(false, Ordering::SeqCst);
                std::process::exit(1);
            }
        }
        Err(e) => error!(group = group.label(), error = %e, "unexpected accept error"),
    }
}

/// Short-lived scrape handler for the metrics listener group: render the
/// current counters and write them back as a minimal HTTP response, then
/// let the connection close.
async fn write_metrics_response(mut stream: tokio::net::TcpStream, metrics: &MetricsExporter) -> std::io::Result<()> {
    let body = metrics.encode();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

async fn handle_control(supervisor: Arc<Supervisor>, stream: UnixStream) {
    dispatch::handle_connection(supervisor, stream).await;
}
