// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging subsystem start-up (§4.1 step 3, "start the logging subsystem").
//!
//! `CONSOLE` and `FILE` are implemented directly on `tracing-subscriber`.
//! `SYSLOG` transport is outside this design's scope (logging transport is
//! an explicit non-goal), so it logs one warning on the console subscriber
//! and continues there rather than silently dropping every subsequent line.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use pgmoneta_core::LogType;
use tracing_subscriber::EnvFilter;

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber according to `log_type`. Safe to
/// call once per process; a second call is a no-op (`try_init` swallows the
/// "already set" error since the daemonize fork path may run startup twice
/// in the same binary before and after detaching).
pub fn init(log_type: LogType, log_path: &Path) {
    match log_type {
        LogType::Console => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter()).try_init();
        }
        LogType::File => match open_log_file(log_path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .try_init();
            }
            Err(e) => {
                let _ = tracing_subscriber::fmt().with_env_filter(filter()).try_init();
                tracing::warn!(path = %log_path.display(), error = %e, "could not open log file, logging to console instead");
            }
        },
        LogType::Syslog => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter()).try_init();
            tracing::warn!("syslog logging transport is not implemented in this build; logging to console instead");
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_log_file_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pgmoneta.log");

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "hello").unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn open_log_file_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
