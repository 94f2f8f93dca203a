// Copyright (C) 2024-2026 The Meridian Project.
//
// lib.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Core types for the Meridian ledger client SDK.
//!
//! This crate carries the entity identifiers, timestamps, wire status codes,
//! the error taxonomy, and the binary io layer shared by every other crate
//! in the workspace. It is deliberately free of network or crypto concerns.

pub mod io;

mod account_id;
mod error;
mod status;
mod timestamp;
mod transaction_id;

pub use account_id::AccountId;
pub use error::{Error, Result};
pub use status::Status;
pub use timestamp::{Timestamp, NANOS_PER_SECOND};
pub use transaction_id::TransactionId;
