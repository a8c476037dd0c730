// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel client: connects to the supervisor's local socket, writes
//! one framed request, and for every kind except `BACKUP` reads back the
//! structured reply (the dispatcher never writes one for `BACKUP` on the
//! current contract).

use std::path::{Path, PathBuf};

use pgmoneta_core::protocol::{ControlKind, ControlRequest, ControlResponse};
use pgmoneta_core::wire;
use thiserror::Error;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {0}: {1}")]
    Connect(PathBuf, std::io::Error),

    #[error("control channel error: {0}")]
    Protocol(#[from] pgmoneta_core::PgmonetaError),
}

/// Default control socket path: `<dir>/pgmoneta.sock`.
pub fn default_socket_path(unix_socket_dir: &Path) -> PathBuf {
    unix_socket_dir.join(pgmoneta_core::CONTROL_SOCKET_NAME)
}

/// Send one control request and return its reply, if the kind carries one.
pub async fn send(
    socket_path: &Path,
    kind: ControlKind,
    slots: Vec<String>,
) -> Result<Option<ControlResponse>, ClientError> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| ClientError::Connect(socket_path.to_path_buf(), e))?;

    let request = ControlRequest { kind, slots };
    wire::write_request(&mut stream, &request).await?;

    if kind == ControlKind::Backup {
        return Ok(None);
    }

    let response = wire::read_response(&mut stream).await?;
    Ok(Some(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_socket_path_joins_well_known_name() {
        let path = default_socket_path(Path::new("/tmp"));
        assert_eq!(path, PathBuf::from("/tmp/pgmoneta.sock"));
    }

    #[tokio::test]
    async fn send_reads_back_reply_for_non_backup_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.sock");
        let listener = tokio::net::UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let req = wire::read_request(&mut stream).await.unwrap();
            assert_eq!(req.kind, ControlKind::IsAlive);
            wire::write_response(&mut stream, &ControlResponse::IsAlive { alive: true })
                .await
                .unwrap();
        });

        let response = send(&path, ControlKind::IsAlive, Vec::new()).await.unwrap();
        assert_eq!(response, Some(ControlResponse::IsAlive { alive: true }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn send_returns_none_for_backup_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pgmoneta.sock");
        let listener = tokio::net::UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let req = wire::read_request(&mut stream).await.unwrap();
            assert_eq!(req.kind, ControlKind::Backup);
        });

        let response = send(&path, ControlKind::Backup, vec!["primary".to_string()])
            .await
            .unwrap();
        assert_eq!(response, None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn send_fails_when_socket_missing() {
        let err = send(Path::new("/nonexistent/pgmoneta.sock"), ControlKind::IsAlive, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Connect(_, _)));
    }
}
