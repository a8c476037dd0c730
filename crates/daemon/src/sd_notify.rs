// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal `sd_notify(3)`-protocol client: a single datagram write to the
//! socket named by `$NOTIFY_SOCKET`, with no dependency on libsystemd. Used
//! to report readiness, status, and stopping to an init system that
//! supports the protocol; a no-op everywhere else.

use std::os::unix::net::UnixDatagram;

pub struct Notifier {
    socket_path: Option<String>,
}

impl Notifier {
    pub fn from_env() -> Self {
        Notifier {
            socket_path: std::env::var("NOTIFY_SOCKET").ok(),
        }
    }

    fn send(&self, message: &str) {
        let Some(path) = &self.socket_path else {
            return;
        };

        if let Ok(socket) = UnixDatagram::unbound() {
            // A best-effort notification: failures here must never affect
            // the supervisor's own startup or shutdown sequencing.
            let _ = socket.send_to(message.as_bytes(), path);
        }
    }

    pub fn ready(&self) {
        self.send(&format!("READY=1\nMAINPID={}", std::process::id()));
    }

    pub fn status(&self, status: &str) {
        self.send(&format!("STATUS={status}"));
    }

    pub fn stopping(&self) {
        self.send("STOPPING=1");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn absent_notify_socket_is_silent() {
        std::env::remove_var("NOTIFY_SOCKET");
        let notifier = Notifier::from_env();
        notifier.ready();
        notifier.status("running");
        notifier.stopping();
    }

    #[test]
    #[serial]
    fn ready_message_sends_over_unix_datagram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notify.sock");
        let listener = UnixDatagram::bind(&path).unwrap();

        std::env::set_var("NOTIFY_SOCKET", path.to_str().unwrap());
        let notifier = Notifier::from_env();
        notifier.ready();

        let mut buf = [0u8; 256];
        let (n, _) = listener.recv_from(&mut buf).unwrap();
        let msg = String::from_utf8_lossy(&buf[..n]);
        assert!(msg.starts_with("READY=1"));

        std::env::remove_var("NOTIFY_SOCKET");
    }
}
