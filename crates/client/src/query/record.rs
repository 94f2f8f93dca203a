//! Record polling.

use std::time::Duration;

use meridian_core::io::SerializableExt;
use meridian_core::{AccountId, Error, Result, Status, TransactionId};

use crate::execute::{execute_any, Execute};
use crate::protocol::{QueryPayload, RequestEnvelope, ResponseEnvelope, TransactionRecord};
use crate::Client;

/// Polls for the full record of a submitted transaction.
///
/// Records lag receipts: a node may know the receipt before it has
/// assembled the record, so both "receipt not found" and "record not
/// found" count as not-yet-known here.
#[derive(Debug, Clone, Default)]
pub struct TransactionRecordQuery {
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_attempts: Option<u32>,
    min_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
}

impl TransactionRecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> &mut Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    pub fn set_node_account_ids(&mut self, node_account_ids: Vec<AccountId>) -> &mut Self {
        self.node_account_ids = Some(node_account_ids);
        self
    }

    pub fn set_max_attempts(&mut self, max_attempts: u32) -> &mut Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn set_min_backoff(&mut self, min_backoff: Duration) -> &mut Self {
        self.min_backoff = Some(min_backoff);
        self
    }

    pub fn set_max_backoff(&mut self, max_backoff: Duration) -> &mut Self {
        self.max_backoff = Some(max_backoff);
        self
    }

    pub async fn execute(&self, client: &Client) -> Result<TransactionRecord> {
        execute_any(client, self, None).await
    }

    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionRecord> {
        execute_any(client, self, Some(timeout)).await
    }
}

impl Execute for TransactionRecordQuery {
    type Response = TransactionRecord;

    fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    fn make_request(&self, _node_account_id: AccountId) -> Result<Vec<u8>> {
        let transaction_id = self.transaction_id.ok_or_else(|| {
            Error::Validation("record query requires a transaction id".to_string())
        })?;

        Ok(RequestEnvelope::Query(QueryPayload::Record { transaction_id }).to_array())
    }

    fn should_retry_status(&self, status: Status) -> bool {
        matches!(
            status,
            Status::Unknown | Status::ReceiptNotFound | Status::RecordNotFound
        )
    }

    fn should_retry_response(&self, response: &ResponseEnvelope) -> bool {
        TransactionRecord::from_array(&response.body)
            .map(|record| record.receipt.status == Status::Unknown)
            .unwrap_or(false)
    }

    fn make_response(
        &self,
        response: ResponseEnvelope,
        _node_account_id: AccountId,
    ) -> Result<Self::Response> {
        Ok(TransactionRecord::from_array(&response.body)?)
    }

    fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    fn min_backoff(&self) -> Option<Duration> {
        self.min_backoff
    }

    fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff
    }
}
