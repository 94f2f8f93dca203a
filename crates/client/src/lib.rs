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

//! Execution engine and network client for the Meridian ledger.
//!
//! The flow through this crate: a caller builds a [`Transaction`], freezes
//! it (fixing the structural payload and candidate nodes), collects
//! signatures (possibly across processes via
//! [`FrozenTransaction::to_bytes`]/[`FrozenTransaction::from_bytes`]), and
//! submits it. [`execute_any`] drives every request through node selection,
//! failover, and backoff until it reaches a terminal outcome; receipt
//! polling and chunked uploads are specializations of the same engine.

mod client;
mod execute;
pub mod network;
pub mod protocol;
mod query;
mod transaction;
mod transport;

pub use client::{
    Client, Operator, DEFAULT_NETWORK_REFRESH_PERIOD, NETWORK_REFRESH_INITIAL_DELAY,
};
pub use execute::{execute_any, Execute, ExecutionConfig};
pub use network::{
    parse_address_book_json, AddressBookSource, Network, Node, NodeAddressEntry, StaticAddressBook,
};
pub use protocol::{
    AccountBalance, ChunkInfo, TransactionPayload, TransactionReceipt, TransactionRecord,
};
pub use query::{AccountBalanceQuery, TransactionReceiptQuery, TransactionRecordQuery};
pub use transaction::{
    BlobUploadTransaction, FrozenTransaction, Transaction, TransactionResponse,
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS, DEFAULT_MAX_FEE, DEFAULT_VALID_DURATION,
};
pub use transport::{HttpTransport, Transport, TransportFault};

// The core types every caller needs alongside the client.
pub use meridian_core::{AccountId, Error, Result, Status, Timestamp, TransactionId};
