// Copyright (C) 2024-2026 The Meridian Project.
//
// transaction_id.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Logical operation identifiers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use crate::{AccountId, Error, Timestamp};

/// Identifies one logical operation on the ledger.
///
/// The pair of paying account and `valid_start` instant is what makes a
/// submission exactly-once: the ledger deduplicates on it, so resubmitting
/// the same id can never apply an operation twice. Renders as
/// `"realm.num@seconds.nanos"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId {
    /// The account paying for the operation.
    pub account_id: AccountId,
    /// The instant from which the operation is valid.
    pub valid_start: Timestamp,
}

impl TransactionId {
    pub const fn new(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
        }
    }

    /// Generates a fresh id for `account_id`.
    ///
    /// The valid-start instant is backdated by a few seconds of random
    /// clock-drift allowance so a client slightly ahead of the network
    /// does not produce ids the ledger considers to be from the future.
    pub fn generate(account_id: AccountId) -> Self {
        let drift = Duration::from_millis(rand::thread_rng().gen_range(5_000..8_000));

        Self {
            account_id,
            valid_start: Timestamp::now().minus(drift),
        }
    }

    /// Derives the id of chunk `index` from the chunked operation's base id.
    ///
    /// The derivation advances `valid_start` by `index` nanoseconds, so the
    /// whole sequence can be re-derived from the base id alone and chunk 0
    /// is the base id itself.
    pub fn chunk_derived(base: TransactionId, index: usize) -> Self {
        Self {
            account_id: base.account_id,
            valid_start: base.valid_start.plus_nanos(index as u64),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (account, start) = s
            .split_once('@')
            .ok_or_else(|| Error::Validation(format!("invalid transaction id `{s}`")))?;

        Ok(Self {
            account_id: account.parse()?,
            valid_start: start.parse()?,
        })
    }
}

impl Serializable for TransactionId {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.account_id.serialize(writer);
        self.valid_start.serialize(writer);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            account_id: AccountId::deserialize(reader)?,
            valid_start: Timestamp::deserialize(reader)?,
        })
    }
}
