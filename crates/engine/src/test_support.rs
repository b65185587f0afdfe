// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: a recording spawner, record builders, and an
//! engine wired to a temp-dir store.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

#![allow(clippy::panic)]

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use shq_core::{EventId, EventRecord, FakeClock, RepeatTier, RepeatTiers};
use shq_storage::{AssocParams, FileStore};

use crate::filter::MagFilter;
use crate::resolver::{Engine, EngineConfig};
use crate::supervisor::Spawner;

/// In-memory spawner that records every decision the resolver makes.
#[derive(Debug, Default)]
pub struct FakeSpawner {
    live: HashSet<String>,
    /// Every `(id, action)` spawn request that was honored.
    pub spawned: Vec<(String, String)>,
    /// Ids terminated via kill-and-wait, in order.
    pub killed: Vec<String>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a child is already running for `id`.
    pub fn set_live(&mut self, id: &str) {
        self.live.insert(id.to_string());
    }

    /// Simulate the reaper collecting the child for `id`.
    pub fn finish(&mut self, id: &str) {
        self.live.remove(id);
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Actions spawned for `id`, in order.
    pub fn actions_for(&self, id: &str) -> Vec<&str> {
        self.spawned
            .iter()
            .filter(|(sid, _)| sid == id)
            .map(|(_, action)| action.as_str())
            .collect()
    }
}

#[async_trait]
impl Spawner for FakeSpawner {
    fn is_live(&self, id: &EventId) -> bool {
        self.live.contains(id.as_str())
    }

    fn spawn(&mut self, id: &EventId, action: &str) {
        if self.is_live(id) {
            return;
        }
        self.live.insert(id.as_str().to_string());
        self.spawned
            .push((id.as_str().to_string(), action.to_string()));
    }

    fn reap(&mut self) {
        // Fake children only exit via `finish`.
    }

    async fn kill_and_wait(&mut self, id: &EventId) {
        self.live.remove(id.as_str());
        self.killed.push(id.as_str().to_string());
    }
}

/// Origin record with the fields every filter looks at.
pub fn origin_record(id: &str, time: &str, mag: f64) -> EventRecord {
    let mut rec = EventRecord::bare(id);
    rec.time = Some(time.to_string());
    rec.mag = Some(mag);
    rec.lon = Some(-120.0);
    rec.lat = Some(36.0);
    rec
}

/// Engine config with the tiers and windows the scenario tests assume:
/// `repeats = { 5.0: [60, 600] }`, `max_trigger_wait = 300`, `minmag = 3.5`.
pub fn test_config(data_root: &Path) -> EngineConfig {
    EngineConfig {
        data_root: data_root.to_path_buf(),
        max_trigger_wait: 300,
        repeats: RepeatTiers::new(vec![RepeatTier {
            threshold: 5.0,
            offsets: vec![60, 600],
        }]),
        mag_filter: MagFilter {
            minmag: 3.5,
            boxes: Vec::new(),
        },
        old_event_age: 365 * 86_400,
        future_event_age: 300,
    }
}

/// Engine over a temp-dir file store, a fake spawner, and a fake clock.
pub fn test_engine(
    dir: &Path,
    clock: FakeClock,
) -> Engine<FileStore<FakeClock>, FakeSpawner, FakeClock> {
    let store = FileStore::open_with(
        dir.join("events.json"),
        AssocParams::default(),
        clock.clone(),
    )
    .unwrap_or_else(|e| panic!("failed to open test store: {e}"));
    Engine::new(
        test_config(&dir.join("data")),
        store,
        FakeSpawner::new(),
        clock,
    )
}
