// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP listener groups: the metrics and remote-management endpoints. Each
//! group binds one or more descriptors for `host:port` (IPv4 and IPv6
//! resolve separately and both are kept), capped at 64 descriptors, with
//! fatal-accept recovery: a fatal `accept()` error stops and rebinds the
//! whole group rather than limping along with a half-dead descriptor set.

use std::net::SocketAddr;

use pgmoneta_core::PgmonetaError;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, warn};

/// Per-group cap shared with the Server Entry array size, so a fully
/// loaded region can still bind a metrics/management socket per address
/// family without overflowing it.
pub const MAX_GROUP_DESCRIPTORS: usize = 64;

pub struct ListenerGroup {
    label: &'static str,
    host: String,
    port: u16,
    listeners: Vec<TcpListener>,
}

impl ListenerGroup {
    /// Bind every resolvable address for `host:port`. A group with a port
    /// of `0` is considered disabled and binds nothing.
    pub async fn bind(label: &'static str, host: &str, port: u16) -> Result<Self, PgmonetaError> {
        let mut listeners = Vec::new();

        if port != 0 {
            let addrs = tokio::net::lookup_host((host, port))
                .await
                .map_err(|e| PgmonetaError::BindFailed(format!("{host}:{port}: {e}")))?;

            for addr in addrs {
                if listeners.len() >= MAX_GROUP_DESCRIPTORS {
                    return Err(PgmonetaError::CapacityExceeded {
                        kind: "listener descriptors",
                        count: listeners.len() + 1,
                        max: MAX_GROUP_DESCRIPTORS,
                    });
                }
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|e| PgmonetaError::BindFailed(format!("{addr}: {e}")))?;
                listeners.push(listener);
            }
        }

        Ok(ListenerGroup {
            label,
            host: host.to_string(),
            port,
            listeners,
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn descriptor_count(&self) -> usize {
        self.listeners.len()
    }

    /// Accept the next connection ready on any descriptor in this group.
    /// On a fatal error, the caller is expected to call [`Self::rebind`]
    /// and keep running; on a transient error, the caller simply calls
    /// this again.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), PgmonetaError> {
        if self.listeners.is_empty() {
            std::future::pending::<()>().await;
        }

        let (result, _, _) = futures_select_all(&self.listeners).await;
        result.map_err(pgmoneta_core::accept::classify_accept_error)
    }

    /// Stop and rebind this group from scratch, used after a fatal accept
    /// error or after a `RELOAD` changes the configured port.
    pub async fn rebind(&mut self, port: u16) -> Result<(), PgmonetaError> {
        warn!(group = self.label, "rebinding listener group");
        self.listeners.clear();
        self.port = port;
        let fresh = ListenerGroup::bind(self.label, &self.host, port).await?;
        self.listeners = fresh.listeners;
        Ok(())
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop this group: drop every descriptor it owns without rebinding.
    /// Used during teardown so this group's `Drop` finds nothing bound and
    /// stays silent, matching a clean shutdown.
    pub fn stop(&mut self) {
        self.listeners.clear();
    }
}

/// `select_all` over a borrowed slice of listeners' `accept()` futures.
/// Written by hand because `futures::future::select_all` needs owned
/// futures and these listeners are long-lived and borrowed, not consumed.
async fn futures_select_all(
    listeners: &[TcpListener],
) -> (std::io::Result<(TcpStream, SocketAddr)>, usize, ()) {
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct SelectAny<'a> {
        listeners: &'a [TcpListener],
    }

    impl<'a> Future for SelectAny<'a> {
        type Output = (std::io::Result<(TcpStream, SocketAddr)>, usize, ());

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            for (idx, listener) in self.listeners.iter().enumerate() {
                if let Poll::Ready(result) = listener.poll_accept(cx) {
                    return Poll::Ready((result, idx, ()));
                }
            }
            Poll::Pending
        }
    }

    SelectAny { listeners }.await
}

impl Drop for ListenerGroup {
    fn drop(&mut self) {
        if !self.listeners.is_empty() {
            error!(group = self.label, "listener group dropped while bound");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_group_binds_nothing() {
        let group = ListenerGroup::bind("metrics", "127.0.0.1", 0).await.unwrap();
        assert!(!group.is_enabled());
        assert_eq!(group.descriptor_count(), 0);
    }

    #[tokio::test]
    async fn binds_at_least_one_descriptor_on_loopback() {
        let group = ListenerGroup::bind("metrics", "127.0.0.1", 0).await.unwrap();
        drop(group);
        let group = ListenerGroup::bind("metrics", "127.0.0.1", 18321).await.unwrap();
        assert!(group.is_enabled());
        assert!(group.descriptor_count() >= 1);
    }

    #[tokio::test]
    async fn accept_and_rebind_round_trip() {
        let mut group = ListenerGroup::bind("metrics", "127.0.0.1", 18322).await.unwrap();

        let connector = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tokio::net::TcpStream::connect("127.0.0.1:18322").await.unwrap()
        });

        let (_, _) = group.accept().await.unwrap();
        connector.await.unwrap();

        group.rebind(18323).await.unwrap();
        assert!(group.is_enabled());
    }

    #[tokio::test]
    async fn stop_empties_the_group_and_silences_drop() {
        let mut group = ListenerGroup::bind("metrics", "127.0.0.1", 18324).await.unwrap();
        assert!(group.is_enabled());

        group.stop();

        assert!(!group.is_enabled());
        assert_eq!(group.descriptor_count(), 0);
    }
}
