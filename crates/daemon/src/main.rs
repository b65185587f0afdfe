// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ShakeQueue Daemon (shqd)
//!
//! Long-running process that receives earthquake triggers on a TCP socket,
//! decides whether each event should be (re)processed by the map-generation
//! program, and supervises the children it launches.
//!
//! Architecture:
//! - Control loop: single thread, `select!` over accept / signals / tick
//! - Periodic driver: repeat scan, child reaping, associator, DB maintenance

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod lifecycle;
mod listener;
mod periodic;
mod protocol;

use std::path::PathBuf;
use std::time::Duration;

use shq_core::{Clock, SystemClock};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::Config;
use crate::lifecycle::LifecycleError;
use crate::periodic::Cadences;

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Run in the foreground, logging to stderr.
    attached: bool,
    /// Explicit config file path.
    config: Option<PathBuf>,
}

enum ArgsOutcome {
    Run(Args),
    Exit(i32),
}

fn parse_args(argv: &[String]) -> ArgsOutcome {
    let mut args = Args::default();
    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("shqd {}", env!("CARGO_PKG_VERSION"));
                return ArgsOutcome::Exit(0);
            }
            "--help" | "-h" | "help" => {
                println!("shqd {}", env!("CARGO_PKG_VERSION"));
                println!("ShakeQueue Daemon - receives earthquake triggers and dispatches");
                println!("map-generation runs");
                println!();
                println!("USAGE:");
                println!("    shqd [--attached] [--config <PATH>]");
                println!();
                println!("OPTIONS:");
                println!("    --attached       Stay in the foreground and log to stderr");
                println!("    --config <PATH>  Configuration file (default: <state_dir>/queue.toml)");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return ArgsOutcome::Exit(0);
            }
            "--attached" => args.attached = true,
            "--config" => match iter.next() {
                Some(path) => args.config = Some(PathBuf::from(path)),
                None => {
                    eprintln!("error: --config requires a path");
                    return ArgsOutcome::Exit(1);
                }
            },
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: shqd [--attached] [--config <PATH>]");
                return ArgsOutcome::Exit(1);
            }
        }
    }
    ArgsOutcome::Run(args)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args(&std::env::args().skip(1).collect::<Vec<_>>()) {
        ArgsOutcome::Run(args) => args,
        ArgsOutcome::Exit(code) => std::process::exit(code),
    };

    let config_path = match args.config {
        Some(path) => path,
        None => env::config_path()?,
    };
    let config = Config::load(&config_path)?;

    // Rotate the log before the appender opens it.
    if !args.attached {
        rotate_log_if_needed(&config.log_path);
    }
    let _log_guard = setup_logging(&config, args.attached)?;

    info!(config = %config_path.display(), "starting daemon");

    let startup = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("shqd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            return Err(e.into());
        }
    };
    let lifecycle::StartupResult {
        mut engine,
        listener,
        allow,
        lock_file: _lock_file,
    } = startup;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut cadences = Cadences::new(SystemClock.now());

    // The interval must outlive the loop: `select!` re-evaluates its
    // branches every iteration, and an interval built inside would restart
    // on each accepted connection and starve the periodic driver.
    let mut tick = tokio::time::interval(tick_interval());

    info!(port = config.port, "daemon ready");

    loop {
        tokio::select! {
            // Incoming trigger connection, handled inline: the resolver is
            // the single writer of event state.
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = listener::handle_connection(stream, peer, &allow, &mut engine).await {
                            error!("handler failure processing trigger: {}", e);
                            return Err(e.into());
                        }
                    }
                    Err(e) => error!("accept error: {}", e),
                }
            }

            // Graceful shutdown on SIGTERM. Children are left running; they
            // outlive the daemon benignly.
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }

            // Periodic work: reap, repeats, and the slow cadences.
            _ = tick.tick() => {
                if let Err(e) = cadences.tick(&mut engine, config.associate_interval) {
                    error!("handler failure in periodic driver: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    info!("daemon stopped");
    Ok(())
}

/// Control-loop tick interval, configurable via `SHQ_TICK_MS` (default: 1000ms).
fn tick_interval() -> Duration {
    env::tick_ms().unwrap_or(Duration::from_secs(1))
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file once it exceeds [`MAX_LOG_SIZE`], shifting
/// `daemon.log` through `.1`/`.2`/`.3` and dropping the oldest.
/// Best-effort: a failed rename must not keep the daemon from starting.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Install the tracing subscriber: stderr when attached, a non-blocking
/// file appender otherwise. The guard must stay alive for the daemon's
/// lifetime.
fn setup_logging(
    config: &Config,
    attached: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if attached {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    }

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let parent = config
        .log_path
        .parent()
        .ok_or(LifecycleError::Config(config::ConfigError::NoStateDir))?;
    let file_name = config
        .log_path
        .file_name()
        .ok_or(LifecycleError::Config(config::ConfigError::NoStateDir))?;
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(Some(guard))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
