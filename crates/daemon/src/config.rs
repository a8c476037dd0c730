// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor-owned handle to the Shared Configuration Region.
//!
//! The original design maps one region read/write by every descendant
//! process. Because workers here are tokio tasks inside the supervisor's
//! own address space rather than forked processes, a live cross-process
//! mapping has nothing to synchronize: this wraps the region in an
//! `Arc<RwLock<_>>` instead, satisfying the same invariant (reload
//! replaces the region's contents in place; readers always see either the
//! pre- or post-reload state, never a partial write) without a shared
//! memory segment.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use pgmoneta_core::{ConfigLoadResult, SharedConfig};

#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<SharedConfig>>,
}

impl ConfigHandle {
    pub fn new(config: SharedConfig) -> Self {
        ConfigHandle {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, SharedConfig> {
        self.inner.read()
    }

    /// Replace the region's contents wholesale with the result of a fresh
    /// load from `config_path`. Used by reload; the `Arc` identity does not
    /// change, so existing clones observe the new values on their next
    /// `read()`.
    pub fn reload_main(&self, config_path: &Path) -> Result<(), ConfigLoadResult> {
        let fresh = SharedConfig::load_main(config_path)?;
        let mut guard = self.inner.write();
        let users = std::mem::take(&mut guard.users);
        let admins = std::mem::take(&mut guard.admins);
        let users_path = guard.users_path.clone();
        let admins_path = guard.admins_path.clone();
        *guard = fresh;
        guard.users = users;
        guard.admins = admins;
        guard.users_path = users_path;
        guard.admins_path = admins_path;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_swaps_region_contents_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.conf");
        std::fs::write(&path, "metrics = 9001\n").unwrap();

        let handle = ConfigHandle::new(SharedConfig::load_main(&path).unwrap());
        assert_eq!(handle.read().metrics_port, 9001);

        std::fs::write(&path, "metrics = 9002\n").unwrap();
        handle.reload_main(&path).unwrap();
        assert_eq!(handle.read().metrics_port, 9002);
    }

    #[test]
    fn reload_preserves_loaded_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.conf");
        std::fs::write(&path, "metrics = 9001\n").unwrap();

        let mut config = SharedConfig::load_main(&path).unwrap();
        let users_path = dir.path().join("users.conf");
        std::fs::write(&users_path, "[[user]]\nusername = \"repl\"\npassword = \"x\"\n").unwrap();
        config.load_users(&users_path);

        let handle = ConfigHandle::new(config);
        handle.reload_main(&path).unwrap();
        assert_eq!(handle.read().users.len(), 1);
    }
}
