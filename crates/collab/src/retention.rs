// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention-policy collaborator invoked by the always-armed retention
//! sweep. The actual retention rules (age, count, WAL-dependency windows)
//! are out of scope; this only fixes the per-server apply shape.

use async_trait::async_trait;
use pgmoneta_core::ServerEntry;

#[async_trait]
pub trait RetentionPolicy: Send + Sync {
    /// Apply retention to `server`, returning the backup identifiers that
    /// were removed.
    async fn apply(&self, server: &ServerEntry) -> Vec<String>;
}

/// Retention policy that removes nothing. Default when no real policy is
/// configured.
#[derive(Debug, Default)]
pub struct NoopRetentionPolicy;

#[async_trait]
impl RetentionPolicy for NoopRetentionPolicy {
    async fn apply(&self, _server: &ServerEntry) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_policy_removes_nothing() {
        let policy = NoopRetentionPolicy;
        let server = ServerEntry {
            name: "a".into(),
            host: "h".into(),
            port: 1,
            username: "u".into(),
            hot_standby: String::new(),
            workers: 0,
        };
        assert!(policy.apply(&server).await.is_empty());
    }
}
