// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The handler contract: what the daemon requires of its event database.
//!
//! The resolver and periodic driver are written against this trait; the
//! file-backed [`crate::FileStore`] is the production implementation.

use shq_core::{EventId, EventRecord};
use thiserror::Error;

/// Errors surfaced by handler operations.
///
/// Handler I/O failures are fatal to the daemon; the trait assumes each
/// operation is atomic (no partial writes observable by a later call).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate event id: {0}")]
    DuplicateEvent(EventId),

    #[error("unknown event id: {0}")]
    UnknownEvent(EventId),
}

/// Event + unassociated-amplitude database.
pub trait EventHandler {
    /// Fetch an event by primary id.
    fn get_event(&self, id: &EventId) -> Option<EventRecord>;

    /// Persist an event. With `update` set an existing row is replaced;
    /// without it a duplicate id is an error.
    fn insert_event(&mut self, record: &EventRecord, update: bool) -> Result<(), StorageError>;

    /// Remove an event row.
    fn delete_event(&mut self, id: &EventId) -> Result<(), StorageError>;

    /// Events with non-empty repeat schedules, as
    /// `(id, origin epoch, schedule)` triples. Events whose origin time no
    /// longer parses are skipped.
    fn get_repeats(&self) -> Vec<(EventId, i64, Vec<i64>)>;

    /// Attach unassociated amplitudes to events, consuming the ones that
    /// match. Returns the ids of events that newly gained data, deduplicated.
    fn associate_all(&mut self) -> Result<Vec<EventId>, StorageError>;

    /// Drop unassociated amplitudes older than `days`. Returns how many were
    /// removed.
    fn clean_amps(&mut self, days: i64) -> Result<usize, StorageError>;

    /// Drop events whose origin time is older than `days`. Returns how many
    /// were removed.
    fn clean_events(&mut self, days: i64) -> Result<usize, StorageError>;
}
