// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Magnitude acceptance filter.
//!
//! A global `minmag` applies everywhere; named boxes override it for events
//! whose epicenter falls inside, letting a network run smaller events in
//! regions of interest.

use serde::Deserialize;

/// A rectangular region with its own magnitude threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct MagBox {
    pub name: String,
    pub minmag: f64,
    pub lon1: f64,
    pub lat1: f64,
    pub lon2: f64,
    pub lat2: f64,
}

impl MagBox {
    fn contains(&self, lon: f64, lat: f64) -> bool {
        let (lon_lo, lon_hi) = ordered(self.lon1, self.lon2);
        let (lat_lo, lat_hi) = ordered(self.lat1, self.lat2);
        lon >= lon_lo && lon <= lon_hi && lat >= lat_lo && lat <= lat_hi
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The magnitude-vs-location acceptance predicate for new events.
#[derive(Debug, Clone, Default)]
pub struct MagFilter {
    pub minmag: f64,
    pub boxes: Vec<MagBox>,
}

impl MagFilter {
    /// Whether an event of magnitude `mag` at the given location should be
    /// processed. The first box containing the epicenter supplies the
    /// threshold; events without a location are judged against the global
    /// minimum.
    pub fn passes(&self, mag: f64, lon: Option<f64>, lat: Option<f64>) -> bool {
        let threshold = match (lon, lat) {
            (Some(lon), Some(lat)) => self
                .boxes
                .iter()
                .find(|b| b.contains(lon, lat))
                .map_or(self.minmag, |b| b.minmag),
            _ => self.minmag,
        };
        mag >= threshold
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
