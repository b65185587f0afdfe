// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ShakeQueue daemon library
//!
//! This module exposes the wire-protocol types for use by client tools.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod protocol;

pub use protocol::{decode, ProtocolError, Trigger, TriggerKind, MAX_SIZE, READ_TIMEOUT};
