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

//! Rust client SDK for the Meridian permissioned ledger network.
//!
//! This facade re-exports the public surface of the workspace crates:
//!
//! - [`meridian_core`] — identifiers, timestamps, statuses, errors, io
//! - [`meridian_crypto`] — keys and signing
//! - [`meridian_client`] — the client, execution engine, transactions,
//!   queries, and network management
//!
//! ```no_run
//! use meridian::{AccountId, Client, NodeAddressEntry, Transaction};
//!
//! # async fn example() -> meridian::Result<()> {
//! let client = Client::for_network(vec![
//!     NodeAddressEntry::new(AccountId::new(3), "10.0.0.1:50211"),
//!     NodeAddressEntry::new(AccountId::new(4), "10.0.0.2:50211"),
//! ])?;
//! client.set_operator(AccountId::new(2), "302e0201...".parse()?);
//!
//! let response = Transaction::transfer(AccountId::new(2), AccountId::new(9), 100)
//!     .execute(&client)
//!     .await?;
//! let receipt = response.get_receipt(&client).await?;
//! # Ok(())
//! # }
//! ```

pub use meridian_client::*;
pub use meridian_core::io;
pub use meridian_crypto::{sha384, PrivateKey, PublicKey, Signature};
