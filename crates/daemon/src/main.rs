// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pgmonetad — the supervisor binary.
//!
//! Parses the handful of CLI options the lifecycle's startup pipeline needs,
//! starts the logging subsystem (step 3 of §4.1 runs before the pipeline so
//! that even a missing/invalid configuration file is reported through the
//! same logger an operator would otherwise see), then hands off to
//! [`lifecycle::run`] for everything else.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod dispatch;
mod lifecycle;
mod listener;
mod logging;
mod pidfile;
mod proctitle;
mod reload;
mod sd_notify;
mod signals;
mod supervisor;

use std::path::PathBuf;

use clap::Parser;

use crate::lifecycle::StartupOptions;

#[derive(Parser)]
#[command(
    name = "pgmoneta",
    disable_help_flag = true,
    disable_version_flag = true,
    about = "Backup / restore supervisor for a PostgreSQL-compatible cluster"
)]
struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Users file
    #[arg(short = 'u', long = "users", value_name = "USERS")]
    users: Option<PathBuf>,

    /// Admins file
    #[arg(short = 'A', long = "admins", value_name = "ADMINS")]
    admins: Option<PathBuf>,

    /// Run as a daemon
    #[arg(short = 'd', long = "daemon")]
    daemon: bool,

    /// Display version information
    #[arg(short = 'V', long = "version")]
    version: bool,

    /// Display help
    #[arg(short = '?', long = "help")]
    help: bool,
}

fn print_help() {
    println!("pgmoneta {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: pgmoneta [ -c CONFIG_FILE ] [ -u USERS_FILE ] [ -A ADMINS_FILE ]");
    println!("                [ -d ] [ -V ] [ -? ]");
    println!();
    println!("Options:");
    println!("  -c, --config CONFIG_FILE   Set the path to the pgmoneta.conf file");
    println!("  -u, --users USERS_FILE     Set the path to the pgmoneta_users.conf file");
    println!("  -A, --admins ADMINS_FILE   Set the path to the pgmoneta_admins.conf file");
    println!("  -d, --daemon               Run as a daemon");
    println!("  -V, --version              Display version information");
    println!("  -?, --help                 Display help");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("pgmoneta {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    if cli.help {
        print_help();
        return;
    }

    let mut options = StartupOptions::defaults();
    if let Some(config) = cli.config {
        options.config_path = config;
    }
    if let Some(users) = cli.users {
        options.users_path = users;
    }
    if let Some(admins) = cli.admins {
        options.admins_path = admins;
    }
    options.daemonize = cli.daemon;

    let (log_type, log_path) = pgmoneta_core::peek_log_settings(&options.config_path);
    logging::init(log_type, &log_path);

    match lifecycle::run(options).await {
        Ok(()) => std::process::exit(0),
        Err(message) => {
            eprintln!("pgmoneta: {message}");
            std::process::exit(1);
        }
    }
}
