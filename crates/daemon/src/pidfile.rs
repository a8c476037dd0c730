// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID file creation and removal.
//!
//! Written once at startup with `O_CREAT|O_EXCL` semantics so a second
//! supervisor pointed at the same PID file path fails loudly instead of
//! overwriting the running instance's file. Removed only on clean
//! shutdown; a crash leaves it behind for the operator to investigate.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use pgmoneta_core::PgmonetaError;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create the PID file exclusively and write the current process's PID.
    /// An existing file at this path is fatal, surfaced as
    /// [`PgmonetaError::PidfileExists`].
    pub fn create(path: &Path) -> Result<Self, PgmonetaError> {
        let mut opts = OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        opts.mode(0o644);

        let mut file = opts
            .open(path)
            .map_err(|_| PgmonetaError::PidfileExists(path.to_path_buf()))?;

        let pid = std::process::id();
        write!(file, "{pid}\n")?;

        Ok(PidFile { path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the PID file. Called on clean shutdown only; a process that
    /// dies before reaching shutdown leaves the file for operators to see.
    pub fn remove(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
