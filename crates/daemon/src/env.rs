// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;

/// Resolve state directory: SHQ_STATE_DIR > XDG_STATE_HOME/shakeq > ~/.local/state/shakeq
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("SHQ_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("shakeq"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/shakeq"))
}

/// Configuration file path: SHQ_CONFIG > <state_dir>/queue.toml
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("SHQ_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    Ok(state_dir()?.join("queue.toml"))
}

/// Control-loop tick interval override
pub fn tick_ms() -> Option<Duration> {
    std::env::var("SHQ_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
