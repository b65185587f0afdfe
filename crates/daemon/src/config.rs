// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Loaded from a TOML file (default `<state_dir>/queue.toml`, overridable
//! with `--config` or `SHQ_CONFIG`). A missing file yields the defaults; a
//! file that fails to parse or validate is fatal at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use shq_core::{RepeatTier, RepeatTiers};
use shq_engine::{MagBox, MagFilter, ShakeConfig};
use shq_storage::AssocParams;
use thiserror::Error;

/// Errors from loading or validating configuration. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid repeat threshold '{0}': not a number")]
    InvalidThreshold(String),

    #[error("repeat offsets for '{0}' must be ascending")]
    UnsortedOffsets(String),

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("could not determine state directory (HOME not set)")]
    NoStateDir,
}

/// Seconds given either as a bare integer or a suffixed string
/// ("90s", "30m", "12h", "365d"). Bare integers may be negative, which
/// some options use to mean "disabled".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Int(i64),
    Text(String),
}

impl Seconds {
    fn resolve(&self) -> Result<i64, ConfigError> {
        match self {
            Seconds::Int(v) => Ok(*v),
            Seconds::Text(s) => parse_duration_secs(s),
        }
    }
}

/// Parse a duration string like "30s", "5m", "12h", "365d" into seconds.
pub fn parse_duration_secs(s: &str) -> Result<i64, ConfigError> {
    let s = s.trim();
    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: i64 = num_str
        .parse()
        .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;

    let multiplier = match suffix.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86_400,
        "y" | "yr" | "year" | "years" => 365 * 86_400,
        _ => return Err(ConfigError::InvalidDuration(s.to_string())),
    };

    Ok(num * multiplier)
}

/// How the map-generation program is configured in the TOML file.
#[derive(Debug, Default, Deserialize)]
struct RawShake {
    program: Option<PathBuf>,
    autorun_modules: Option<Vec<String>>,
    cancel_module: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    port: Option<u16>,
    servers: Option<Vec<String>>,
    associate_interval: Option<Seconds>,
    max_trigger_wait: Option<Seconds>,
    minmag: Option<f64>,
    #[serde(default)]
    boxes: Vec<MagBox>,
    repeats: Option<BTreeMap<String, Vec<i64>>>,
    old_event_age: Option<Seconds>,
    future_event_age: Option<Seconds>,
    data_root: Option<PathBuf>,
    db_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    assoc_window: Option<Seconds>,
    assoc_degrees: Option<f64>,
    #[serde(default)]
    shake: RawShake,
}

/// Fully-resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the trigger listener binds.
    pub port: u16,
    /// Allow-listed peer hostnames.
    pub servers: Vec<String>,
    /// Seconds between associator runs; negative disables.
    pub associate_interval: i64,
    /// Hysteresis window, seconds.
    pub max_trigger_wait: i64,
    /// Magnitude acceptance predicate.
    pub mag_filter: MagFilter,
    /// Magnitude-tiered repeat offsets.
    pub repeats: RepeatTiers,
    /// Oldest acceptable origin time, seconds before now.
    pub old_event_age: i64,
    /// Farthest acceptable origin time, seconds after now.
    pub future_event_age: i64,
    /// Root state directory.
    pub state_dir: PathBuf,
    /// Root of per-event data directories.
    pub data_root: PathBuf,
    /// Event store file.
    pub db_path: PathBuf,
    /// Daemon log file.
    pub log_path: PathBuf,
    /// Lock/PID file.
    pub lock_path: PathBuf,
    /// Amplitude association window.
    pub assoc: AssocParams,
    /// Map-generation program invocation.
    pub shake: ShakeConfig,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str::<RawConfig>(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RawConfig::default(),
            Err(e) => return Err(e.into()),
        };
        Self::resolve(raw)
    }

    fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let state_dir = crate::env::state_dir()?;

        let repeats = match raw.repeats {
            Some(table) => parse_repeat_tiers(table)?,
            None => RepeatTiers::default(),
        };

        let shake = ShakeConfig {
            program: raw.shake.program.unwrap_or_else(|| PathBuf::from("shake")),
            autorun_modules: raw
                .shake
                .autorun_modules
                .unwrap_or_else(|| ShakeConfig::default().autorun_modules),
            cancel_module: raw
                .shake
                .cancel_module
                .unwrap_or_else(|| "cancel".to_string()),
        };

        let mut assoc = AssocParams::default();
        if let Some(window) = raw.assoc_window {
            assoc.window_secs = window.resolve()?;
        }
        if let Some(degrees) = raw.assoc_degrees {
            assoc.max_degrees = degrees;
        }

        Ok(Self {
            port: raw.port.unwrap_or(2345),
            servers: raw
                .servers
                .unwrap_or_else(|| vec!["localhost".to_string()]),
            associate_interval: raw
                .associate_interval
                .map_or(Ok(300), |s| s.resolve())?,
            max_trigger_wait: raw.max_trigger_wait.map_or(Ok(600), |s| s.resolve())?,
            mag_filter: MagFilter {
                minmag: raw.minmag.unwrap_or(3.5),
                boxes: raw.boxes,
            },
            repeats,
            old_event_age: raw.old_event_age.map_or(Ok(365 * 86_400), |s| s.resolve())?,
            future_event_age: raw.future_event_age.map_or(Ok(300), |s| s.resolve())?,
            data_root: raw.data_root.unwrap_or_else(|| state_dir.join("data")),
            db_path: raw.db_path.unwrap_or_else(|| state_dir.join("events.json")),
            log_path: raw.log_path.unwrap_or_else(|| state_dir.join("daemon.log")),
            lock_path: state_dir.join("daemon.pid"),
            state_dir,
            assoc,
            shake,
        })
    }
}

/// Parse the `[repeats]` table: magnitude-threshold keys mapping to
/// ascending offset lists.
fn parse_repeat_tiers(table: BTreeMap<String, Vec<i64>>) -> Result<RepeatTiers, ConfigError> {
    let mut tiers = Vec::with_capacity(table.len());
    for (key, offsets) in table {
        let threshold: f64 = key
            .parse()
            .map_err(|_| ConfigError::InvalidThreshold(key.clone()))?;
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnsortedOffsets(key));
        }
        tiers.push(RepeatTier { threshold, offsets });
    }
    Ok(RepeatTiers::new(tiers))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
