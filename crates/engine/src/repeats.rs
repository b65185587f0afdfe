// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repeat scan: fire due entries of every event's schedule.

use shq_core::Clock;
use shq_storage::EventHandler;
use tracing::error;

use crate::error::EngineError;
use crate::resolver::{Engine, ACTION_REPEAT};
use crate::supervisor::Spawner;
use crate::write_event_descriptor;

impl<H: EventHandler, S: Spawner, C: Clock> Engine<H, S, C> {
    /// Walk all events with non-empty schedules and fire the ones whose
    /// head entry has passed. One head is popped per event per scan.
    ///
    /// When a child is already live for the event the head is popped
    /// without dispatching: the run in progress covers this firing. The
    /// pop and the spawn happen with no intervening await, so a trigger
    /// accepted on the next loop iteration sees a consistent child table.
    pub fn scan_repeats(&mut self) -> Result<(), EngineError> {
        let now = self.clock.now();
        for (id, _origin, repeats) in self.handler.get_repeats() {
            let Some(head) = repeats.first().copied() else {
                continue;
            };
            if head >= now {
                continue;
            }
            let Some(mut record) = self.handler.get_event(&id) else {
                continue;
            };

            if self.spawner.is_live(&id) {
                record.pop_repeat();
                self.handler.insert_event(&record, true)?;
                continue;
            }

            // The stored record may carry newer data than the on-disk copy.
            if let Err(e) = write_event_descriptor(&self.config.data_root, &record) {
                error!(id = %id, error = %e, "failed to rewrite event descriptor");
            }
            self.spawner.spawn(&id, ACTION_REPEAT);
            record.pop_repeat();
            record.lastrun = Some(now);
            self.handler.insert_event(&record, true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "repeats_tests.rs"]
mod tests;
