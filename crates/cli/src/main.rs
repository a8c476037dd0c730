// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pgmoneta-cli — control client for the supervisor.
//!
//! Translates one subcommand into one framed request on the local control
//! socket and prints the reply. `backup` has no reply on the current
//! contract (see [`pgmoneta_core::protocol`]), so it simply reports that the
//! request was sent.

mod client;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pgmoneta_core::protocol::{ControlKind, ControlResponse};

#[derive(Parser)]
#[command(name = "pgmoneta-cli", about = "Control client for the pgmoneta supervisor")]
struct Cli {
    /// Directory containing the supervisor's control socket
    #[arg(short = 's', long = "unix-socket-dir", value_name = "DIR", default_value = "/tmp")]
    unix_socket_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trigger a backup of the named server
    Backup { server: String },
    /// List known backups for the named server
    ListBackup { server: String },
    /// Delete one backup from the named server
    Delete { server: String, backup_id: String },
    /// Stop the supervisor
    Stop,
    /// Print supervisor runtime status
    Status,
    /// Print detailed configuration
    Details,
    /// Check whether the supervisor is responding
    IsAlive,
    /// Zero the metrics counters
    Reset,
    /// Reread configuration files and rebind listener groups
    Reload,
}

impl Command {
    fn kind(&self) -> ControlKind {
        match self {
            Command::Backup { .. } => ControlKind::Backup,
            Command::ListBackup { .. } => ControlKind::ListBackup,
            Command::Delete { .. } => ControlKind::Delete,
            Command::Stop => ControlKind::Stop,
            Command::Status => ControlKind::Status,
            Command::Details => ControlKind::Details,
            Command::IsAlive => ControlKind::IsAlive,
            Command::Reset => ControlKind::Reset,
            Command::Reload => ControlKind::Reload,
        }
    }

    fn slots(&self) -> Vec<String> {
        match self {
            Command::Backup { server } | Command::ListBackup { server } => vec![server.clone()],
            Command::Delete { server, backup_id } => vec![server.clone(), backup_id.clone()],
            Command::Stop
            | Command::Status
            | Command::Details
            | Command::IsAlive
            | Command::Reset
            | Command::Reload => Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let socket_path = client::default_socket_path(&cli.unix_socket_dir);

    match client::send(&socket_path, cli.command.kind(), cli.command.slots()).await {
        Ok(Some(response)) => {
            print_response(&response);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("backup request sent");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("pgmoneta-cli: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_response(response: &ControlResponse) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{response:?}"),
    }
}
