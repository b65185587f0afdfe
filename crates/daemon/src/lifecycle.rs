// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: lock acquisition, store opening, socket binding.

use std::fs::File;
use std::io::Write;
use std::net::Ipv4Addr;

use fs2::FileExt;
use shq_core::SystemClock;
use shq_engine::{Engine, EngineConfig, Supervisor};
use shq_storage::{FileStore, StorageError};
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::listener::AllowList;

/// Listen backlog for the trigger socket.
const BACKLOG: u32 = 5;

/// Engine with the daemon's concrete handler, spawner, and clock.
pub type DaemonEngine = Engine<FileStore, Supervisor, SystemClock>;

/// Errors during startup. All are fatal.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("another daemon already holds the lock")]
    LockFailed(#[source] std::io::Error),
}

/// Everything `startup` hands back to the control loop.
#[derive(Debug)]
pub struct StartupResult {
    pub engine: DaemonEngine,
    pub listener: TcpListener,
    pub allow: AllowList,
    // NOTE(lifetime): Held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    pub lock_file: File,
}

/// Acquire the lock, open the store, resolve the allow-list, and bind the
/// trigger socket.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.data_root)?;

    let mut lock_file = File::create(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let store = FileStore::open_with(&config.db_path, config.assoc, SystemClock)?;
    let supervisor = Supervisor::new(config.shake.clone());
    let engine = Engine::new(
        EngineConfig {
            data_root: config.data_root.clone(),
            max_trigger_wait: config.max_trigger_wait,
            repeats: config.repeats.clone(),
            mag_filter: config.mag_filter.clone(),
            old_event_age: config.old_event_age,
            future_event_age: config.future_event_age,
        },
        store,
        supervisor,
        SystemClock,
    );

    let allow = AllowList::resolve(&config.servers).await;

    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind((Ipv4Addr::UNSPECIFIED, config.port).into())?;
    let listener = socket.listen(BACKLOG)?;
    info!(port = config.port, "trigger listener bound");

    Ok(StartupResult {
        engine,
        listener,
        allow,
        lock_file,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
