// Copyright (C) 2024-2026 The Meridian Project.
//
// error.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Error taxonomy for the Meridian client SDK.

use crate::io::IoError;
use crate::{AccountId, Status, TransactionId};

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the SDK can surface to a caller.
///
/// Surfaced errors keep their context: a ledger rejection carries the code,
/// the node that answered, and the transaction id; an exhausted retry budget
/// carries a description of the last attempt's failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The request is malformed; submitting it would never succeed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A node could not be reached or did not answer in time.
    #[error("transport failure against {address}: {message}")]
    Transport { address: String, message: String },

    /// The ledger answered and explicitly rejected the request.
    #[error("node {node_account_id} returned status {status} for {}", display_opt_id(.transaction_id))]
    Status {
        status: Status,
        transaction_id: Option<TransactionId>,
        node_account_id: AccountId,
    },

    /// A polled receipt reached a terminal state other than success.
    #[error("receipt for {} carries failure status {status}", display_opt_id(.transaction_id))]
    ReceiptStatus {
        status: Status,
        transaction_id: Option<TransactionId>,
    },

    /// The retry budget (attempts or overall deadline) ran out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// An operation was used in the wrong freeze state, or a signature
    /// failed verification.
    #[error("signature error: {0}")]
    Signature(String),

    /// Wire bytes could not be decoded.
    #[error(transparent)]
    Io(#[from] IoError),
}

impl Error {
    /// Timeout error describing the last failure observed before exhaustion.
    pub fn timed_out(last_error: Option<&Error>) -> Self {
        let message = match last_error {
            Some(err) => err.to_string(),
            None => "no attempt completed".to_string(),
        };
        Self::Timeout { message }
    }

    /// Whether the execution engine may transparently retry after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => status.is_transient(),
            _ => false,
        }
    }
}

fn display_opt_id(id: &Option<TransactionId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<no transaction id>".to_string(),
    }
}
