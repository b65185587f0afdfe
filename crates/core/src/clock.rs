// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for time-dependent logic.
//!
//! The resolver, repeat scan, and periodic driver all take their notion of
//! "now" from a [`Clock`] so tests can drive time deterministically.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time as whole epoch seconds.
pub trait Clock {
    /// Current time, seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// Wall-clock implementation used by the daemon.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// Manually-advanced clock for tests.
///
/// Cloning shares the underlying instant, so a clone handed to the system
/// under test sees every `advance` made by the test body.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Arc<AtomicI64>,
}

impl FakeClock {
    /// Create a clock pinned to an arbitrary fixed epoch.
    pub fn new() -> Self {
        Self::at(1_700_000_000)
    }

    /// Create a clock pinned to the given epoch second.
    pub fn at(epoch: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(epoch)),
        }
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Pin the clock to an absolute epoch second.
    pub fn set(&self, epoch: i64) {
        self.now.store(epoch, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
