// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process supervision.
//!
//! The supervisor owns every map-generation child the daemon launches. It
//! enforces at most one child per event id, polls for exits on each tick,
//! and offers a synchronous kill-and-wait used during alias reconciliation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use shq_core::{Clock, EventId, SystemClock};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::resolver::ACTION_CANCEL;

/// How the map-generation program is invoked.
#[derive(Debug, Clone)]
pub struct ShakeConfig {
    /// Path to the executable.
    pub program: PathBuf,
    /// Modules appended for a processing run: `<program> <id> <modules...>`.
    pub autorun_modules: Vec<String>,
    /// Module appended for a cancellation: `<program> <id> <cancel_module>`.
    pub cancel_module: String,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("shake"),
            autorun_modules: vec![
                "select".to_string(),
                "assemble".to_string(),
                "model".to_string(),
                "mapping".to_string(),
            ],
            cancel_module: "cancel".to_string(),
        }
    }
}

/// The seam between the resolver and process management.
#[async_trait]
pub trait Spawner {
    /// Whether a child is currently tracked for this id.
    fn is_live(&self, id: &EventId) -> bool;

    /// Launch a child for the event. A live child for the same id makes
    /// this a no-op.
    fn spawn(&mut self, id: &EventId, action: &str);

    /// Poll every tracked child and drop the ones that have exited.
    /// Non-blocking.
    fn reap(&mut self);

    /// Terminate the child for this id (if any) and wait for it to exit.
    async fn kill_and_wait(&mut self, id: &EventId);
}

/// One live subprocess.
#[derive(Debug)]
struct ChildRecord {
    child: Child,
    /// Epoch second the child was started.
    started: i64,
    /// Trigger string that launched it.
    action: String,
}

/// Production supervisor over `tokio::process` children.
#[derive(Debug, Default)]
pub struct Supervisor {
    shake: ShakeConfig,
    children: HashMap<String, ChildRecord>,
}

impl Supervisor {
    pub fn new(shake: ShakeConfig) -> Self {
        Self {
            shake,
            children: HashMap::new(),
        }
    }

    /// Number of currently-tracked children.
    pub fn live_count(&self) -> usize {
        self.children.len()
    }
}

#[async_trait]
impl Spawner for Supervisor {
    fn is_live(&self, id: &EventId) -> bool {
        self.children.contains_key(id.as_str())
    }

    fn spawn(&mut self, id: &EventId, action: &str) {
        if self.is_live(id) {
            debug!(id = %id, action, "child already live, not spawning");
            return;
        }

        let mut cmd = Command::new(&self.shake.program);
        cmd.arg(id.as_str());
        if action == ACTION_CANCEL {
            cmd.arg(&self.shake.cancel_module);
        } else {
            cmd.args(&self.shake.autorun_modules);
        }
        cmd.stdin(Stdio::null());

        match cmd.spawn() {
            Ok(child) => {
                info!(id = %id, action, pid = ?child.id(), "spawned child");
                self.children.insert(
                    id.as_str().to_string(),
                    ChildRecord {
                        child,
                        started: SystemClock.now(),
                        action: action.to_string(),
                    },
                );
            }
            Err(e) => {
                error!(id = %id, program = %self.shake.program.display(), error = %e,
                       "failed to spawn child");
            }
        }
    }

    /// Uses `try_wait`, never `wait`, so a slow child cannot stall the
    /// control loop.
    fn reap(&mut self) {
        let mut finished = Vec::new();
        for (id, rec) in self.children.iter_mut() {
            match rec.child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    info!(id = %id, action = %rec.action, "child finished");
                    finished.push(id.clone());
                }
                Ok(Some(status)) => {
                    warn!(id = %id, action = %rec.action, %status, "child exited abnormally");
                    finished.push(id.clone());
                }
                Ok(None) => {}
                Err(e) => {
                    error!(id = %id, error = %e, "failed to poll child, dropping record");
                    finished.push(id.clone());
                }
            }
        }
        for id in finished {
            self.children.remove(&id);
        }
    }

    async fn kill_and_wait(&mut self, id: &EventId) {
        let Some(mut rec) = self.children.remove(id.as_str()) else {
            return;
        };
        let ran_for = SystemClock.now() - rec.started;
        info!(id = %id, action = %rec.action, ran_for, "terminating live child");
        if let Err(e) = rec.child.kill().await {
            warn!(id = %id, error = %e, "failed to terminate child");
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
