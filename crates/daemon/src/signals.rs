// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal Dispatcher: turns OS signals into a typed event stream the event
//! loop consumes, instead of running handler logic directly inside a
//! signal handler. `tokio::signal::unix` already keeps delivery
//! signal-safe and coalesces repeated deliveries between polls, which is
//! exactly the "at most one handler run per tick" guarantee the contract
//! asks for.

use tokio::signal::unix::{signal, Signal, SignalKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    Terminate,
    Interrupt,
    Alarm,
    Reload,
    Abort,
}

pub struct SignalDispatcher {
    term: Signal,
    int: Signal,
    alrm: Signal,
    hup: Signal,
    abrt: Signal,
}

impl SignalDispatcher {
    pub fn install() -> std::io::Result<Self> {
        Ok(SignalDispatcher {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
            alrm: signal(SignalKind::alarm())?,
            hup: signal(SignalKind::hangup())?,
            abrt: signal(SignalKind::from_raw(libc::SIGABRT))?,
        })
    }

    /// Wait for the next signal of interest and translate it to an event.
    /// Cancel-safe: used directly inside the event loop's `tokio::select!`.
    pub async fn next(&mut self) -> SupervisorEvent {
        tokio::select! {
            _ = self.term.recv() => SupervisorEvent::Terminate,
            _ = self.int.recv() => SupervisorEvent::Interrupt,
            _ = self.alrm.recv() => SupervisorEvent::Alarm,
            _ = self.hup.recv() => SupervisorEvent::Reload,
            _ = self.abrt.recv() => SupervisorEvent::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hup_maps_to_reload_event() {
        let mut dispatcher = SignalDispatcher::install().unwrap();
        let pid = nix::unistd::Pid::this();
        nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGHUP).unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(2), dispatcher.next())
            .await
            .unwrap();
        assert_eq!(event, SupervisorEvent::Reload);
    }
}
