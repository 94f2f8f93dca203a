//! Authoritative address-book side channel.
//!
//! The network refreshes itself from an [`AddressBookSource`]: anything
//! that can produce the current `(account id, address)` list. Refresh
//! failures never surface to callers; the previous snapshot stays live.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use meridian_core::{AccountId, Error, Result};

/// One row of the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAddressEntry {
    pub account_id: AccountId,
    pub address: String,
}

impl NodeAddressEntry {
    pub fn new(account_id: AccountId, address: impl Into<String>) -> Self {
        Self {
            account_id,
            address: address.into(),
        }
    }
}

/// A side channel that produces the authoritative node list.
#[async_trait]
pub trait AddressBookSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<NodeAddressEntry>>;
}

/// A fixed in-memory address book.
#[derive(Debug, Clone)]
pub struct StaticAddressBook {
    entries: Vec<NodeAddressEntry>,
}

impl StaticAddressBook {
    pub fn new(entries: Vec<NodeAddressEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl AddressBookSource for StaticAddressBook {
    async fn fetch(&self) -> Result<Vec<NodeAddressEntry>> {
        Ok(self.entries.clone())
    }
}

#[derive(Deserialize)]
struct AddressBookDocument {
    nodes: Vec<NodeAddressEntry>,
}

/// Parses an address-book JSON document of the form
/// `{"nodes": [{"accountId": "0.3", "address": "host:port"}, ...]}`.
pub fn parse_address_book_json(json: &str) -> Result<Vec<NodeAddressEntry>> {
    let document: AddressBookDocument = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("invalid address book document: {e}")))?;
    Ok(document.nodes)
}
