// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic Scheduler: the WAL-compression sweep and the retention sweep.
//!
//! Both tasks share a fixed 60-second period and zero initial offset. Each
//! carries its own overlap guard: a tick that finds its own previous run
//! still in flight skips rather than stacking, the explicit guard the
//! design notes recommend in place of the original's unconditional-fork
//! cascade risk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const PERIODIC_INTERVAL: Duration = Duration::from_secs(60);

/// Acquired for the duration of one tick's handler; `Drop` releases it so
/// the next tick can proceed once this one finishes, however long that
/// takes.
pub struct TickGuard {
    armed: Arc<AtomicBool>,
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct PeriodicTask {
    running: Arc<AtomicBool>,
}

impl Default for PeriodicTask {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicTask {
    pub fn new() -> Self {
        PeriodicTask {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Try to begin this tick. Returns `None` if the previous tick's
    /// handler has not finished yet, meaning the caller should skip this
    /// tick entirely rather than spawn a second concurrent handler.
    pub fn try_begin_tick(&self) -> Option<TickGuard> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(TickGuard {
                armed: self.running.clone(),
            })
        } else {
            None
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// The two armed periodic tasks. `wal_compression` is `None` when the
/// compression policy is `NONE`; the scheduler invariant is that no
/// compression handler ever fires in that case, which this encodes by
/// simply having no task to fire.
pub struct PeriodicScheduler {
    pub wal_compression: Option<PeriodicTask>,
    pub retention: PeriodicTask,
}

impl PeriodicScheduler {
    pub fn new(compression_armed: bool) -> Self {
        PeriodicScheduler {
            wal_compression: if compression_armed { Some(PeriodicTask::new()) } else { None },
            retention: PeriodicTask::new(),
        }
    }
}
