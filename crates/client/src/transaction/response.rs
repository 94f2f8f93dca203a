//! The handle returned by a successful submission.

use meridian_core::{AccountId, Error, Result, Status, TransactionId};

use crate::protocol::{TransactionReceipt, TransactionRecord};
use crate::query::{TransactionReceiptQuery, TransactionRecordQuery};
use crate::Client;

/// Proof that a node accepted a transaction for consensus.
///
/// Acceptance is not execution: the outcome arrives later, by polling
/// [`get_receipt`](Self::get_receipt) or [`get_record`](Self::get_record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    /// The node that accepted the submission.
    pub node_account_id: AccountId,
    /// The logical operation id to poll for.
    pub transaction_id: TransactionId,
    /// SHA-384 hash of the signed bytes the node accepted.
    pub transaction_hash: Vec<u8>,
}

impl TransactionResponse {
    /// Polls the accepting node until the receipt reaches a terminal state.
    ///
    /// Receipt visibility can be node-local right after submission, so the
    /// poll is pinned to the node that accepted the transaction while that
    /// node is still part of the network. A terminal receipt carrying a
    /// failure status is surfaced as [`Error::ReceiptStatus`].
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        let mut query = TransactionReceiptQuery::new();
        query.set_transaction_id(self.transaction_id);
        if client.network().node(&self.node_account_id).is_some() {
            query.set_node_account_ids(vec![self.node_account_id]);
        }

        let receipt = query.execute(client).await?;
        self.validate_receipt_status(receipt.status)?;
        Ok(receipt)
    }

    /// Polls for the full record of the transaction.
    pub async fn get_record(&self, client: &Client) -> Result<TransactionRecord> {
        let mut query = TransactionRecordQuery::new();
        query.set_transaction_id(self.transaction_id);
        if client.network().node(&self.node_account_id).is_some() {
            query.set_node_account_ids(vec![self.node_account_id]);
        }

        let record = query.execute(client).await?;
        self.validate_receipt_status(record.receipt.status)?;
        Ok(record)
    }

    fn validate_receipt_status(&self, status: Status) -> Result<()> {
        if status != Status::Ok {
            return Err(Error::ReceiptStatus {
                status,
                transaction_id: Some(self.transaction_id),
            });
        }
        Ok(())
    }
}
