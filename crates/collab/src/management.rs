// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-management collaborator, invoked once per connection accepted by
//! the remote-management listener group. The interaction protocol and
//! authentication are out of scope; this only fixes the per-connection
//! entry point the listener group needs, with the peer address already
//! resolved by the caller.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpStream;

#[async_trait]
pub trait RemoteManagementHandler: Send + Sync {
    /// Handle one remote-management connection from `peer`. Expected to
    /// read the request, write a reply, and let `stream` close before
    /// returning; the caller does not touch `stream` again afterward.
    async fn handle(&self, stream: TcpStream, peer: SocketAddr);
}

/// Handler that closes the connection without reading or writing
/// anything. Used when no real remote-management backend is configured.
#[derive(Debug, Default)]
pub struct NoopRemoteManagementHandler;

#[async_trait]
impl RemoteManagementHandler for NoopRemoteManagementHandler {
    async fn handle(&self, _stream: TcpStream, _peer: SocketAddr) {}
}
