// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for incoming triggers.
//!
//! Each TCP connection carries a single UTF-8 JSON document:
//! `{"type": <string>, "data": {"id": <string>, ...}}`. The connection is
//! closed after one document.

use shq_core::EventRecord;
use shq_engine::{ACTION_CANCEL, ACTION_ORIGIN};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Maximum trigger document size (256 KiB).
pub const MAX_SIZE: usize = 256 * 1024;

/// Per-connection read timeout.
pub const READ_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed trigger: {0}")]
    Shape(&'static str),

    #[error("document too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("read timed out")]
    Timeout,
}

/// Kind of trigger, from the document's `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    Origin,
    Cancel,
    /// Any site-defined trigger type; the string doubles as the action.
    Other(String),
}

/// A decoded trigger ready for the resolver.
#[derive(Debug)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Action string the dispatch is tagged with.
    pub action: String,
    pub record: EventRecord,
}

/// Read one trigger document, bounded by [`MAX_SIZE`] and [`READ_TIMEOUT`].
pub async fn read_document<R: AsyncRead + Unpin>(reader: R) -> Result<Vec<u8>, ProtocolError> {
    let mut limited = reader.take(MAX_SIZE as u64 + 1);
    let mut buf = Vec::new();
    tokio::time::timeout(READ_TIMEOUT, limited.read_to_end(&mut buf))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    if buf.len() > MAX_SIZE {
        return Err(ProtocolError::TooLarge {
            size: buf.len(),
            max: MAX_SIZE,
        });
    }
    Ok(buf)
}

/// Decode and shape-check a trigger document.
pub fn decode(bytes: &[u8]) -> Result<Trigger, ProtocolError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let doc = value
        .as_object()
        .ok_or(ProtocolError::Shape("document is not an object"))?;
    let kind = doc
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or(ProtocolError::Shape("missing string field 'type'"))?;
    let data = doc
        .get("data")
        .and_then(|v| v.as_object())
        .ok_or(ProtocolError::Shape("missing object field 'data'"))?;
    if !data.get("id").is_some_and(|v| v.is_string()) {
        return Err(ProtocolError::Shape("missing string field 'data.id'"));
    }

    let record: EventRecord = serde_json::from_value(serde_json::Value::Object(data.clone()))?;

    let (kind, action) = match kind {
        "origin" => {
            // Origin payloads may name their own action.
            let action = record
                .extra
                .get("action")
                .and_then(|v| v.as_str())
                .unwrap_or(ACTION_ORIGIN)
                .to_string();
            (TriggerKind::Origin, action)
        }
        "cancel" => (TriggerKind::Cancel, ACTION_CANCEL.to_string()),
        other => (TriggerKind::Other(other.to_string()), other.to_string()),
    };

    Ok(Trigger {
        kind,
        action,
        record,
    })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
