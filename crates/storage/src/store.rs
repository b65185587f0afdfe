// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed event store.
//!
//! The whole table is held in memory and written back as one JSON document
//! on every mutation (write to `.tmp`, fsync, atomic rename). A corrupt
//! store file is moved aside to `.bak` at load so the daemon can start with
//! an empty table instead of refusing to boot.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shq_core::{Clock, EventId, EventRecord, SystemClock};
use tracing::{debug, warn};

use crate::handler::{EventHandler, StorageError};

/// One unassociated amplitude observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplitude {
    /// Station code that produced the observation.
    pub station: String,
    /// Observation time, epoch seconds.
    pub time: i64,
    pub lon: f64,
    pub lat: f64,
}

/// Association window: an amplitude joins an event when its time is within
/// `window_secs` of the origin time and its location within `max_degrees`
/// great-circle degrees of the epicenter.
#[derive(Debug, Clone, Copy)]
pub struct AssocParams {
    pub window_secs: i64,
    pub max_degrees: f64,
}

impl Default for AssocParams {
    fn default() -> Self {
        Self {
            window_secs: 120,
            max_degrees: 0.5,
        }
    }
}

/// Everything persisted in the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    events: HashMap<String, EventRecord>,
    #[serde(default)]
    amps: Vec<Amplitude>,
    /// Amplitudes already attached to an event, keyed by event id.
    #[serde(default)]
    associated: HashMap<String, Vec<Amplitude>>,
}

/// JSON-snapshot-backed implementation of the handler contract.
#[derive(Debug)]
pub struct FileStore<C = SystemClock> {
    path: PathBuf,
    state: StoreState,
    assoc: AssocParams,
    clock: C,
}

impl FileStore<SystemClock> {
    /// Open (or create) a store at `path` with default association knobs.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::open_with(path, AssocParams::default(), SystemClock)
    }
}

impl<C: Clock> FileStore<C> {
    /// Open (or create) a store with explicit association parameters and
    /// clock. Tests pass a `FakeClock` here.
    pub fn open_with(
        path: impl Into<PathBuf>,
        assoc: AssocParams,
        clock: C,
    ) -> Result<Self, StorageError> {
        let path = path.into();
        let state = load_state(&path)?;
        Ok(Self {
            path,
            state,
            assoc,
            clock,
        })
    }

    /// Queue an amplitude observation for later association.
    pub fn insert_amp(&mut self, amp: Amplitude) -> Result<(), StorageError> {
        self.state.amps.push(amp);
        self.save()
    }

    /// Amplitudes attached to an event so far.
    pub fn associated_amps(&self, id: &EventId) -> &[Amplitude] {
        self.state
            .associated
            .get(id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn event_count(&self) -> usize {
        self.state.events.len()
    }

    pub fn amp_count(&self) -> usize {
        self.state.amps.len()
    }

    /// Write the table back atomically: temp file, fsync, rename.
    fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &self.state)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Load the store file, starting empty when it is missing and shunting a
/// corrupt file to `.bak`.
fn load_state(path: &Path) -> Result<StoreState, StorageError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreState::default()),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(state) => Ok(state),
        Err(e) => {
            let backup = path.with_extension("bak");
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                error = %e,
                "corrupt event store, moving aside and starting empty"
            );
            fs::rename(path, &backup)?;
            Ok(StoreState::default())
        }
    }
}

/// Great-circle separation between two points, in degrees of arc.
fn angular_degrees(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
}

impl<C: Clock> EventHandler for FileStore<C> {
    fn get_event(&self, id: &EventId) -> Option<EventRecord> {
        self.state.events.get(id.as_str()).cloned()
    }

    fn insert_event(&mut self, record: &EventRecord, update: bool) -> Result<(), StorageError> {
        if !update && self.state.events.contains_key(record.id.as_str()) {
            return Err(StorageError::DuplicateEvent(record.id.clone()));
        }
        self.state
            .events
            .insert(record.id.as_str().to_string(), record.clone());
        self.save()
    }

    fn delete_event(&mut self, id: &EventId) -> Result<(), StorageError> {
        if self.state.events.remove(id.as_str()).is_none() {
            return Err(StorageError::UnknownEvent(id.clone()));
        }
        self.state.associated.remove(id.as_str());
        self.save()
    }

    fn get_repeats(&self) -> Vec<(EventId, i64, Vec<i64>)> {
        let mut out = Vec::new();
        for record in self.state.events.values() {
            let Some(repeats) = record.repeats.as_ref().filter(|r| !r.is_empty()) else {
                continue;
            };
            match record.origin_epoch() {
                Ok(origin) => out.push((record.id.clone(), origin, repeats.clone())),
                Err(e) => debug!(id = %record.id, error = %e, "skipping event in repeat scan"),
            }
        }
        out
    }

    fn associate_all(&mut self) -> Result<Vec<EventId>, StorageError> {
        // Epicenter index of events an amplitude could join.
        let targets: Vec<(String, i64, f64, f64)> = self
            .state
            .events
            .values()
            .filter_map(|rec| {
                let origin = rec.origin_epoch().ok()?;
                Some((rec.id.as_str().to_string(), origin, rec.lon?, rec.lat?))
            })
            .collect();

        let mut touched: Vec<EventId> = Vec::new();
        let mut remaining = Vec::with_capacity(self.state.amps.len());
        for amp in self.state.amps.drain(..) {
            let hit = targets.iter().find(|(_, origin, lon, lat)| {
                (amp.time - origin).abs() <= self.assoc.window_secs
                    && angular_degrees(amp.lon, amp.lat, *lon, *lat) <= self.assoc.max_degrees
            });
            match hit {
                Some((id, _, _, _)) => {
                    self.state
                        .associated
                        .entry(id.clone())
                        .or_default()
                        .push(amp);
                    if !touched.iter().any(|t| t.as_str() == id) {
                        touched.push(EventId::new(id.clone()));
                    }
                }
                None => remaining.push(amp),
            }
        }
        self.state.amps = remaining;

        if !touched.is_empty() {
            self.save()?;
        }
        Ok(touched)
    }

    fn clean_amps(&mut self, days: i64) -> Result<usize, StorageError> {
        let cutoff = self.clock.now() - days * 86_400;
        let before = self.state.amps.len();
        self.state.amps.retain(|amp| amp.time >= cutoff);
        let removed = before - self.state.amps.len();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    fn clean_events(&mut self, days: i64) -> Result<usize, StorageError> {
        let cutoff = self.clock.now() - days * 86_400;
        let expired: Vec<String> = self
            .state
            .events
            .values()
            .filter(|rec| matches!(rec.origin_epoch(), Ok(origin) if origin < cutoff))
            .map(|rec| rec.id.as_str().to_string())
            .collect();
        for id in &expired {
            self.state.events.remove(id);
            self.state.associated.remove(id);
        }
        if !expired.is_empty() {
            self.save()?;
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
