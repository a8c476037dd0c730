// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-standby mirror: invoked by the backup workflow after a backup
//! finalizes, for any server configured with a non-empty standby path.
//!
//! Grounded directly in the original mirror stage: delete the destination
//! directory if it exists, recreate it, then copy the finalized backup's
//! data tree into it. The copy fans out across a rayon work pool when the
//! server's configured worker count is positive, and runs serially
//! otherwise. Duration is logged as `HH:MM:SS`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use pgmoneta_core::{PgmonetaError, ServerEntry};
use tracing::info;

pub struct HotStandbyMirror;

impl HotStandbyMirror {
    /// Mirror `<base_dir>/<server>/backup/<backup_id>/data` into
    /// `<server.hot_standby>/<server.name>/`. No-op if the server has no
    /// hot-standby path configured.
    pub fn mirror(base_dir: &Path, server: &ServerEntry, backup_id: &str) -> Result<(), PgmonetaError> {
        if !server.has_hot_standby() {
            return Ok(());
        }

        let src = base_dir
            .join(&server.name)
            .join("backup")
            .join(backup_id)
            .join("data");
        let dst = Path::new(&server.hot_standby).join(&server.name);

        let start = Instant::now();

        if dst.exists() {
            std::fs::remove_dir_all(&dst)?;
        }
        std::fs::create_dir_all(&dst)?;

        if server.workers > 0 {
            copy_directory_parallel(&src, &dst, server.workers as usize)?;
        } else {
            copy_directory_serial(&src, &dst)?;
        }

        let elapsed = start.elapsed();
        let total_secs = elapsed.as_secs();
        info!(
            server = %server.name,
            backup_id,
            elapsed = %format_hhmmss(total_secs),
            "hot standby mirror complete"
        );

        Ok(())
    }
}

fn format_hhmmss(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn list_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect()
}

fn copy_directory_serial(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in list_entries(src)? {
        copy_entry(&entry, dst)?;
    }
    Ok(())
}

fn copy_directory_parallel(src: &Path, dst: &Path, workers: usize) -> std::io::Result<()> {
    let entries = list_entries(src)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(std::io::Error::other)?;

    pool.install(|| {
        use rayon::prelude::*;
        entries
            .par_iter()
            .try_for_each(|entry| copy_entry(entry, dst))
    })
}

fn copy_entry(entry: &Path, dst: &Path) -> std::io::Result<()> {
    let name = entry
        .file_name()
        .ok_or_else(|| std::io::Error::other("entry with no file name"))?;
    let target = dst.join(name);

    if entry.is_dir() {
        std::fs::create_dir_all(&target)?;
        copy_directory_serial(entry, &target)
    } else {
        std::fs::copy(entry, &target).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(hot_standby: &str, workers: u32) -> ServerEntry {
        ServerEntry {
            name: "primary".into(),
            host: "127.0.0.1".into(),
            port: 5432,
            username: "repl".into(),
            hot_standby: hot_standby.to_string(),
            workers,
        }
    }

    #[test]
    fn no_op_without_hot_standby_path() {
        let dir = tempfile::tempdir().unwrap();
        HotStandbyMirror::mirror(dir.path(), &server("", 0), "1").unwrap();
    }

    #[test]
    fn mirrors_data_directory_serially() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("primary/backup/1/data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("base.tar"), b"contents").unwrap();

        let standby_root = dir.path().join("standby");
        std::fs::create_dir_all(&standby_root).unwrap();

        HotStandbyMirror::mirror(dir.path(), &server(standby_root.to_str().unwrap(), 0), "1").unwrap();

        let mirrored = standby_root.join("primary/base.tar");
        assert!(mirrored.exists());
    }

    #[test]
    fn mirrors_data_directory_in_parallel() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("primary/backup/1/data");
        std::fs::create_dir_all(&data).unwrap();
        for i in 0..4 {
            std::fs::write(data.join(format!("seg{i}")), b"contents").unwrap();
        }

        let standby_root = dir.path().join("standby");
        std::fs::create_dir_all(&standby_root).unwrap();

        HotStandbyMirror::mirror(dir.path(), &server(standby_root.to_str().unwrap(), 4), "1").unwrap();

        for i in 0..4 {
            assert!(standby_root.join(format!("primary/seg{i}")).exists());
        }
    }

    #[test]
    fn stale_destination_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("primary/backup/1/data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("new.tar"), b"contents").unwrap();

        let standby_root = dir.path().join("standby");
        let existing = standby_root.join("primary");
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("stale.tar"), b"old").unwrap();

        HotStandbyMirror::mirror(dir.path(), &server(standby_root.to_str().unwrap(), 0), "1").unwrap();

        assert!(!existing.join("stale.tar").exists());
        assert!(existing.join("new.tar").exists());
    }

    #[test]
    fn format_hhmmss_pads_zero() {
        assert_eq!(format_hhmmss(5), "00:00:05");
        assert_eq!(format_hhmmss(3661), "01:01:01");
    }
}
