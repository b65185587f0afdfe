// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shq-storage: the event + amplitude database behind the handler contract.

pub mod handler;
pub mod store;

pub use handler::{EventHandler, StorageError};
pub use store::{Amplitude, AssocParams, FileStore};
