//! Behavioral specifications for the ShakeQueue daemon.
//!
//! End-to-end scenarios drive the decision engine in-process against a real
//! file store, a fake clock, and a recording spawner; the smoke tests invoke
//! the built binaries.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/scenarios.rs"]
mod scenarios;

#[path = "specs/invariants.rs"]
mod invariants;

#[path = "specs/smoke.rs"]
mod smoke;
