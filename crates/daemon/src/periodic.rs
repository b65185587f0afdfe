// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic driver: the per-tick work and the slower cadences.
//!
//! Three process-wide cadences ride on the control-loop tick, each with its
//! own last-fired stamp: the memory log, the associator, and database
//! maintenance. Memory and maintenance stamps start at zero so both fire on
//! the first tick; the associator starts at startup time so the first run
//! waits a full interval.

use shq_core::Clock;
use shq_engine::{Engine, EngineError, Spawner};
use shq_storage::EventHandler;
use sysinfo::{get_current_pid, ProcessesToUpdate, System};
use tracing::{info, warn};

/// Seconds between resident-set-size log lines.
pub const MEM_LOG_INTERVAL: i64 = 3600;

/// Seconds between database maintenance passes.
pub const DB_MAINT_INTERVAL: i64 = 86_400;

/// Unassociated amplitudes older than this many days are dropped.
pub const AMP_RETAIN_DAYS: i64 = 30;

/// Events older than this many days are dropped.
pub const EVENT_RETAIN_DAYS: i64 = 365;

/// Last-fired stamps for the slow cadences.
pub struct Cadences {
    last_mem: i64,
    last_assoc: i64,
    last_clean: i64,
    system: System,
}

impl Cadences {
    pub fn new(startup: i64) -> Self {
        Self {
            last_mem: 0,
            last_assoc: startup,
            last_clean: 0,
            system: System::new(),
        }
    }

    /// One control-loop tick: reap children, fire due repeats, then run any
    /// slow cadence that has come due.
    pub fn tick<H, S, C>(
        &mut self,
        engine: &mut Engine<H, S, C>,
        associate_interval: i64,
    ) -> Result<(), EngineError>
    where
        H: EventHandler,
        S: Spawner,
        C: Clock,
    {
        let now = engine.clock.now();

        engine.spawner.reap();
        engine.scan_repeats()?;

        if now - self.last_mem >= MEM_LOG_INTERVAL {
            self.log_memory();
            self.last_mem = now;
        }

        if associate_interval >= 0 && now - self.last_assoc >= associate_interval {
            run_associator(engine)?;
            self.last_assoc = now;
        }

        if now - self.last_clean >= DB_MAINT_INTERVAL {
            // Associate first so pending amplitudes are not cleaned away
            // before they had a chance to attach.
            run_associator(engine)?;
            self.last_assoc = now;

            let amps = engine.handler.clean_amps(AMP_RETAIN_DAYS)?;
            let events = engine.handler.clean_events(EVENT_RETAIN_DAYS)?;
            info!(amps, events, "database maintenance complete");
            self.last_clean = now;
        }

        Ok(())
    }

    fn log_memory(&mut self) {
        match get_current_pid() {
            Ok(pid) => {
                self.system
                    .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                if let Some(process) = self.system.process(pid) {
                    info!(rss_bytes = process.memory(), "resident set size");
                }
            }
            Err(e) => warn!(error = e, "could not determine pid for memory log"),
        }
    }
}

/// Run the associator and route every touched id back through the resolver.
fn run_associator<H, S, C>(engine: &mut Engine<H, S, C>) -> Result<(), EngineError>
where
    H: EventHandler,
    S: Spawner,
    C: Clock,
{
    let ids = engine.handler.associate_all()?;
    if !ids.is_empty() {
        info!(count = ids.len(), "associator touched events");
    }
    engine.process_associated(ids)
}

#[cfg(test)]
#[path = "periodic_tests.rs"]
mod tests;
