// Copyright (C) 2024-2026 The Meridian Project.
//
// status.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Wire response status codes.

use std::fmt;

/// Response code returned by a network node for a submitted request.
///
/// The set the execution engine inspects is closed; codes this library does
/// not know about decode as [`Status::Unrecognized`] and are surfaced to the
/// caller rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The request was accepted.
    Ok,
    /// The node is currently overloaded; retry elsewhere.
    Busy,
    /// The consensus platform on the node is not running.
    PlatformNotActive,
    /// The node is up but not yet serving requests.
    NodeStandby,
    /// The outcome of the operation is not yet known.
    Unknown,
    /// No receipt exists (yet) for the polled operation.
    ReceiptNotFound,
    /// No record exists (yet) for the polled operation.
    RecordNotFound,
    /// The transaction failed structural validation.
    InvalidTransaction,
    /// The transaction id was already used.
    DuplicateTransaction,
    /// The transaction's valid-start window has passed.
    TransactionExpired,
    /// The paying account cannot cover the operation.
    InsufficientBalance,
    /// A required signature is missing or does not verify.
    InvalidSignature,
    /// The payload exceeds the per-request size limit.
    PayloadTooLarge,
    /// The chunk metadata is inconsistent with the initial transaction.
    InvalidChunkInfo,
    /// A code this version of the library does not know.
    Unrecognized(i32),
}

impl Status {
    /// Decodes a raw wire code. Total: unknown codes map to `Unrecognized`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Busy,
            2 => Self::PlatformNotActive,
            3 => Self::NodeStandby,
            4 => Self::Unknown,
            5 => Self::ReceiptNotFound,
            6 => Self::RecordNotFound,
            7 => Self::InvalidTransaction,
            8 => Self::DuplicateTransaction,
            9 => Self::TransactionExpired,
            10 => Self::InsufficientBalance,
            11 => Self::InvalidSignature,
            12 => Self::PayloadTooLarge,
            13 => Self::InvalidChunkInfo,
            other => Self::Unrecognized(other),
        }
    }

    /// The raw wire code for this status.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Busy => 1,
            Self::PlatformNotActive => 2,
            Self::NodeStandby => 3,
            Self::Unknown => 4,
            Self::ReceiptNotFound => 5,
            Self::RecordNotFound => 6,
            Self::InvalidTransaction => 7,
            Self::DuplicateTransaction => 8,
            Self::TransactionExpired => 9,
            Self::InsufficientBalance => 10,
            Self::InvalidSignature => 11,
            Self::PayloadTooLarge => 12,
            Self::InvalidChunkInfo => 13,
            Self::Unrecognized(code) => code,
        }
    }

    /// Whether the engine always retries this code, on any request kind.
    ///
    /// These are node conditions, not verdicts about the request: another
    /// node, or the same node a moment later, may accept it.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Busy | Self::PlatformNotActive | Self::NodeStandby)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "UNRECOGNIZED({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_CODES: std::ops::Range<i32> = 0..14;

    #[test]
    fn test_from_code_is_total() {
        for code in -3..100 {
            let status = Status::from_code(code);
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_known_codes_roundtrip_without_unrecognized() {
        for code in KNOWN_CODES {
            let status = Status::from_code(code);
            assert!(
                !matches!(status, Status::Unrecognized(_)),
                "code {code} should be known"
            );
        }
    }

    #[test]
    fn test_transient_set() {
        assert!(Status::Busy.is_transient());
        assert!(Status::PlatformNotActive.is_transient());
        assert!(Status::NodeStandby.is_transient());
        assert!(!Status::Ok.is_transient());
        assert!(!Status::Unknown.is_transient());
        assert!(!Status::InvalidSignature.is_transient());
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::Busy.to_string(), "Busy");
        assert_eq!(Status::Unrecognized(99).to_string(), "UNRECOGNIZED(99)");
    }
}
