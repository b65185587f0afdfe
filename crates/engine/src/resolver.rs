// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger resolution: decide whether an incoming event starts, defers, or
//! drops a processing run.
//!
//! The resolver is the single writer of event state. Every decision path
//! ends in exactly one of: drop (log only), persist-and-shelve (a repeat
//! will cover it), or dispatch (persist, write descriptor, spawn).

use std::path::PathBuf;

use shq_core::{Clock, EventId, EventRecord, RepeatTiers};
use shq_storage::EventHandler;
use tracing::{error, info, warn};

use crate::descriptor::write_event_descriptor;
use crate::error::EngineError;
use crate::filter::MagFilter;
use crate::supervisor::Spawner;

/// Default action string for origin triggers without an explicit one.
pub const ACTION_ORIGIN: &str = "origin";
/// Action string for cancellation dispatches.
pub const ACTION_CANCEL: &str = "cancel";
/// Action string for schedule-driven reruns.
pub const ACTION_REPEAT: &str = "Scheduled repeat";
/// Action string for associator-driven reruns.
pub const ACTION_ASSOCIATE: &str = "Data association";

/// Tuning for the decision engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root of the per-event data directory tree.
    pub data_root: PathBuf,
    /// Hysteresis window in seconds: triggers landing within this window of
    /// a dispatch are shelved onto the repeat schedule instead.
    pub max_trigger_wait: i64,
    /// Magnitude-tiered repeat offsets.
    pub repeats: RepeatTiers,
    /// Magnitude acceptance predicate for new events.
    pub mag_filter: MagFilter,
    /// Maximum age of an acceptable origin time, seconds.
    pub old_event_age: i64,
    /// Maximum lead of an acceptable origin time into the future, seconds.
    pub future_event_age: i64,
}

/// The event decision engine: resolver plus repeat scan over a handler, a
/// spawner, and a clock.
#[derive(Debug)]
pub struct Engine<H, S, C> {
    pub config: EngineConfig,
    pub handler: H,
    pub spawner: S,
    pub clock: C,
}

impl<H: EventHandler, S: Spawner, C: Clock> Engine<H, S, C> {
    pub fn new(config: EngineConfig, handler: H, spawner: S, clock: C) -> Self {
        Self {
            config,
            handler,
            spawner,
            clock,
        }
    }

    /// Resolve an origin trigger.
    pub async fn process_origin(
        &mut self,
        mut record: EventRecord,
        action: &str,
    ) -> Result<(), EngineError> {
        let existing = self.handler.get_event(&record.id);
        let mut force_run = false;
        if existing.is_none() {
            force_run = self.reconcile_aliases(&record).await?;
        }

        let Some(stored) = existing else {
            let now = self.clock.now();
            let mag = record.mag.unwrap_or(0.0);
            if !force_run && !self.config.mag_filter.passes(mag, record.lon, record.lat) {
                info!(id = %record.id, mag, "magnitude below threshold, dropping");
                return Ok(());
            }
            let origin = match record.origin_epoch() {
                Ok(t) => t,
                Err(e) => {
                    error!(id = %record.id, error = %e, "dropping trigger");
                    return Ok(());
                }
            };
            if !force_run {
                if now - origin > self.config.old_event_age {
                    info!(id = %record.id, age = now - origin, "event too old, dropping");
                    return Ok(());
                }
                if origin - now > self.config.future_event_age {
                    info!(id = %record.id, lead = origin - now, "event too far in the future, dropping");
                    return Ok(());
                }
            }
            record.repeats = self.config.repeats.compute(origin, mag, now);
            return self.dispatch(record, false, action);
        };

        self.retrigger(record, stored, action)
    }

    /// Resolve a cancellation trigger: dispatch a cancel child when the
    /// event (or the first known alias) exists, otherwise drop.
    pub fn process_cancel(&mut self, record: EventRecord) -> Result<(), EngineError> {
        let target = if self.handler.get_event(&record.id).is_some() {
            Some(record.id.clone())
        } else {
            record
                .alias_ids()
                .into_iter()
                .find(|alias| self.handler.get_event(alias).is_some())
        };

        match target {
            Some(id) => {
                info!(id = %id, "dispatching cancellation");
                self.spawner.spawn(&id, ACTION_CANCEL);
            }
            None => info!(id = %record.id, "cancellation for unknown event, dropping"),
        }
        Ok(())
    }

    /// Resolve a trigger of any other type. The payload carries only ids;
    /// the stored record is what flows through re-trigger handling.
    pub fn process_other(&mut self, record: EventRecord, action: &str) -> Result<(), EngineError> {
        let stored = self.handler.get_event(&record.id).or_else(|| {
            record
                .alias_ids()
                .into_iter()
                .find_map(|alias| self.handler.get_event(&alias))
        });

        let Some(stored) = stored else {
            info!(id = %record.id, action, "trigger for unknown event, dropping");
            return Ok(());
        };

        info!(id = %stored.id, action, "processing trigger for known event");
        let incoming = stored.clone();
        self.retrigger(incoming, stored, action)
    }

    /// Identity reconciliation: absorb the first known alias of a new
    /// event. Returns whether an alias was consumed (which bypasses the
    /// magnitude and age filters for the new record).
    async fn reconcile_aliases(&mut self, record: &EventRecord) -> Result<bool, EngineError> {
        for alias in record.alias_ids() {
            if self.handler.get_event(&alias).is_none() {
                continue;
            }
            info!(alias = %alias, primary = %record.id, "absorbing alias event");

            if self.spawner.is_live(&alias) {
                self.spawner.kill_and_wait(&alias).await;
            }
            self.handler.delete_event(&alias)?;

            let from = self.config.data_root.join(alias.as_str());
            let to = self.config.data_root.join(record.id.as_str());
            if from.exists() {
                if let Err(e) = std::fs::rename(&from, &to) {
                    warn!(
                        from = %from.display(),
                        to = %to.display(),
                        error = %e,
                        "failed to rename event data directory"
                    );
                }
            }
            // Only the first matching alias is consumed.
            return Ok(true);
        }
        Ok(false)
    }

    /// Re-trigger handling for a known event: carry scheduling state
    /// forward, apply the hysteresis window, dispatch only when nothing
    /// else will cover the trigger.
    fn retrigger(
        &mut self,
        mut record: EventRecord,
        stored: EventRecord,
        action: &str,
    ) -> Result<(), EngineError> {
        // The incoming payload supersedes everything except scheduling state.
        record.lastrun = stored.lastrun;
        record.repeats = stored.repeats;

        let now = self.clock.now();
        let mtw = self.config.max_trigger_wait;

        if self.spawner.is_live(&record.id) {
            // A run is in flight; make sure a repeat will pick up this
            // trigger's (possibly newer) data soon.
            match record.next_repeat() {
                Some(head) if head <= now + mtw => {}
                _ => record.insert_repeat(now + mtw),
            }
            info!(id = %record.id, action, "child live, shelving trigger onto schedule");
            self.handler.insert_event(&record, true)?;
            return Ok(());
        }

        if let Some(head) = record.next_repeat() {
            if now - head > -mtw {
                // Next repeat is due within the window (or overdue); it will
                // carry this data.
                info!(id = %record.id, action, head, "repeat imminent, shelving trigger");
                self.handler.insert_event(&record, true)?;
                return Ok(());
            }
        }

        if let Some(lastrun) = record.lastrun {
            if now - lastrun < mtw {
                record.insert_repeat(now + mtw);
                info!(id = %record.id, action, lastrun, "just ran, deferring to new repeat");
                self.handler.insert_event(&record, true)?;
                return Ok(());
            }
        }

        self.dispatch(record, true, action)
    }

    /// Dispatch: persist with a fresh `lastrun`, write the descriptor, and
    /// spawn the child.
    fn dispatch(
        &mut self,
        mut record: EventRecord,
        update: bool,
        action: &str,
    ) -> Result<(), EngineError> {
        record.lastrun = Some(self.clock.now());
        self.handler.insert_event(&record, update)?;

        if let Err(e) = write_event_descriptor(&self.config.data_root, &record) {
            error!(id = %record.id, error = %e, "failed to write event descriptor");
        }

        info!(id = %record.id, action, "dispatching event");
        self.spawner.spawn(&record.id, action);
        Ok(())
    }

    /// Route ids freshly touched by the associator back through the
    /// resolver.
    pub fn process_associated(&mut self, ids: Vec<EventId>) -> Result<(), EngineError> {
        for id in ids {
            self.process_other(EventRecord::bare(id), ACTION_ASSOCIATE)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
