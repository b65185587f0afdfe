// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event record: the unit of work the daemon decides about.
//!
//! Incoming trigger payloads are dynamic JSON; the fields the resolver reads
//! are typed here and everything else rides along in the `extra` bag so it
//! survives persistence verbatim.

use serde::{Deserialize, Serialize};

use crate::time::{parse_event_time, TimeParseError};

/// Primary identifier of a seismic event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EventId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A seismic event as carried by triggers and persisted in the event table.
///
/// `repeats` and `lastrun` are mutable scheduling state owned by the
/// resolver; the remaining typed fields come from the trigger payload.
/// Unrecognized payload fields land in `extra` and round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,

    /// Comma-separated alternate ids for the same physical event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_eventids: Option<String>,

    /// Origin time as received; one of the two accepted text formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,

    /// Ascending absolute epoch seconds at which the event should be rerun.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeats: Option<Vec<i64>>,

    /// Epoch second of the most recent dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastrun: Option<i64>,

    /// Opaque passthrough fields (rupture descriptors, network codes, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EventRecord {
    /// Minimal record with only an id, as carried by cancel and other-type
    /// trigger payloads.
    pub fn bare(id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            alt_eventids: None,
            time: None,
            mag: None,
            lon: None,
            lat: None,
            depth: None,
            repeats: None,
            lastrun: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Alternate ids, trimmed, with empties and the primary id skipped.
    pub fn alias_ids(&self) -> Vec<EventId> {
        let Some(raw) = self.alt_eventids.as_deref() else {
            return Vec::new();
        };
        raw.split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != self.id.as_str())
            .map(EventId::from)
            .collect()
    }

    /// Parsed origin time as an epoch second.
    ///
    /// A record without a `time` field reports it as unparseable.
    pub fn origin_epoch(&self) -> Result<i64, TimeParseError> {
        let raw = self.time.as_deref().ok_or_else(|| TimeParseError {
            value: String::new(),
        })?;
        Ok(parse_event_time(raw)?.timestamp())
    }

    /// Head of the repeat schedule, if any.
    pub fn next_repeat(&self) -> Option<i64> {
        self.repeats.as_ref().and_then(|r| r.first().copied())
    }

    /// Insert an absolute repeat time, keeping the schedule ascending.
    /// Duplicate entries are dropped.
    pub fn insert_repeat(&mut self, at: i64) {
        let list = self.repeats.get_or_insert_with(Vec::new);
        match list.binary_search(&at) {
            Ok(_) => {}
            Err(pos) => list.insert(pos, at),
        }
    }

    /// Remove the head of the repeat schedule; an emptied schedule becomes
    /// absent.
    pub fn pop_repeat(&mut self) -> Option<i64> {
        let list = self.repeats.as_mut()?;
        if list.is_empty() {
            self.repeats = None;
            return None;
        }
        let head = list.remove(0);
        if list.is_empty() {
            self.repeats = None;
        }
        Some(head)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
