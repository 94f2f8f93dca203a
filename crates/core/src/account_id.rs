// Copyright (C) 2024-2026 The Meridian Project.
//
// account_id.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Ledger account identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::io::{BinaryWriter, IoResult, MemoryReader, Serializable};
use crate::Error;

/// Identifies an account on the Meridian ledger.
///
/// Network nodes are themselves owned by ledger accounts, so an `AccountId`
/// doubles as the node identity used by node selection and receipt polling.
/// Renders as `"realm.num"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    /// The realm the account lives in.
    pub realm: u64,
    /// The account number within the realm.
    pub num: u64,
}

impl AccountId {
    /// Creates an account id in realm 0.
    pub const fn new(num: u64) -> Self {
        Self { realm: 0, num }
    }

    pub const fn with_realm(realm: u64, num: u64) -> Self {
        Self { realm, num }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (realm, num) = s
            .split_once('.')
            .ok_or_else(|| Error::Validation(format!("invalid account id `{s}`")))?;

        let parse = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| Error::Validation(format!("invalid account id `{s}`")))
        };

        Ok(Self {
            realm: parse(realm)?,
            num: parse(num)?,
        })
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for AccountId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serializable for AccountId {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_u64(self.realm);
        writer.write_u64(self.num);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            realm: reader.read_u64()?,
            num: reader.read_u64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SerializableExt;

    #[test]
    fn test_display_and_parse() {
        let id = AccountId::with_realm(1, 42);
        assert_eq!(id.to_string(), "1.42");
        assert_eq!("1.42".parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "3", "a.b", "1.2.3", "-1.2"] {
            assert!(input.parse::<AccountId>().is_err(), "input `{input}`");
        }
    }

    #[test]
    fn test_wire_roundtrip() {
        let id = AccountId::with_realm(7, 1001);
        let decoded = AccountId::from_array(&id.to_array()).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let id = AccountId::new(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0.3\"");
        assert_eq!(serde_json::from_str::<AccountId>(&json).unwrap(), id);
    }
}
