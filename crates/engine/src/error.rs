// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use shq_core::TimeParseError;
use shq_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while resolving triggers or scanning repeats.
///
/// Storage failures are the only fatal kind; everything else is logged and
/// dropped at the site where it occurs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("descriptor error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Time(#[from] TimeParseError),
}
