// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Registry: tracks the long-lived per-server WAL receivers.
//!
//! The original's singly-linked list of PIDs is replaced with an
//! [`indexmap::IndexMap`] keyed by server index, per the ordered-container
//! redesign recommended for this component: O(1) insertion, O(1) removal
//! (amortized `swap_remove` would break ordering, so `shift_remove` is used
//! to preserve append-order iteration for deterministic shutdown), and the
//! key itself enforces "at most one receiver per server" instead of relying
//! on discipline at call sites.

use indexmap::IndexMap;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A running receiver task and the means to ask it to stop.
pub struct WorkerHandle {
    pub server_index: usize,
    pub join: JoinHandle<()>,
    pub shutdown: std::sync::Arc<Notify>,
}

impl WorkerHandle {
    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[derive(Default)]
pub struct WorkerRegistry {
    entries: IndexMap<usize, WorkerHandle>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a receiver for `server_index`. Returns the handle that was
    /// previously registered for this server, if any (a reload that
    /// replaces a receiver must stop the old one explicitly).
    pub fn add(&mut self, handle: WorkerHandle) -> Option<WorkerHandle> {
        self.entries.insert(handle.server_index, handle)
    }

    pub fn remove(&mut self, server_index: usize) -> Option<WorkerHandle> {
        self.entries.shift_remove(&server_index)
    }

    pub fn contains(&self, server_index: usize) -> bool {
        self.entries.contains_key(&server_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate handles in registration order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.entries.values()
    }

    /// Ask every registered receiver to stop and drop it from the
    /// registry. The handles' own tasks are expected to exit promptly in
    /// response to the shutdown notification; this does not await them.
    pub fn stop_all(&mut self) {
        for (_, handle) in self.entries.drain(..) {
            handle.request_shutdown();
        }
    }
}
