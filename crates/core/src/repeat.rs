// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Magnitude-tiered repeat schedules.
//!
//! Configuration maps a magnitude threshold to an ordered list of offsets
//! (seconds after origin time). An event picks the tier with the highest
//! threshold strictly below its magnitude.

use serde::{Deserialize, Serialize};

/// One configured tier: events above `threshold` repeat at `offsets`
/// seconds after their origin time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatTier {
    pub threshold: f64,
    pub offsets: Vec<i64>,
}

/// The full tier table, kept sorted by ascending threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatTiers {
    tiers: Vec<RepeatTier>,
}

impl RepeatTiers {
    /// Build a tier table from (threshold, offsets) pairs in any order.
    pub fn new(mut tiers: Vec<RepeatTier>) -> Self {
        tiers.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        Self { tiers }
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Offsets of the highest tier whose threshold is strictly below `mag`.
    pub fn offsets_for(&self, mag: f64) -> Option<&[i64]> {
        self.tiers
            .iter()
            .rev()
            .find(|t| t.threshold < mag)
            .map(|t| t.offsets.as_slice())
    }

    /// Absolute repeat times for an event: origin time plus each offset of
    /// the selected tier, pruned to entries strictly after `now`.
    ///
    /// Returns `None` when no tier matches or every entry is in the past.
    pub fn compute(&self, origin_epoch: i64, mag: f64, now: i64) -> Option<Vec<i64>> {
        let offsets = self.offsets_for(mag)?;
        let times: Vec<i64> = offsets
            .iter()
            .map(|off| origin_epoch + off)
            .filter(|t| *t > now)
            .collect();
        if times.is_empty() {
            None
        } else {
            Some(times)
        }
    }
}

#[cfg(test)]
#[path = "repeat_tests.rs"]
mod tests;
