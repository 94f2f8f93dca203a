//! Receipt polling.

use std::time::Duration;

use meridian_core::io::SerializableExt;
use meridian_core::{AccountId, Error, Result, Status, TransactionId};

use crate::execute::{execute_any, Execute};
use crate::protocol::{QueryPayload, RequestEnvelope, ResponseEnvelope, TransactionReceipt};
use crate::Client;

/// Polls for the eventual receipt of a submitted transaction.
///
/// Right after submission the network legitimately does not know the
/// outcome yet, so "not yet known" answers are retried, not surfaced: the
/// poll keeps going until the receipt reaches a terminal state or the
/// attempt/timeout budget runs out.
#[derive(Debug, Clone, Default)]
pub struct TransactionReceiptQuery {
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_attempts: Option<u32>,
    min_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
}

impl TransactionReceiptQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation to poll for.
    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> &mut Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Pins the poll to specific nodes, normally the node that accepted
    /// the submission, since receipt visibility can be node-local at first.
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

    pub async fn execute(&self, client: &Client) -> Result<TransactionReceipt> {
        execute_any(client, self, None).await
    }

    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionReceipt> {
        execute_any(client, self, Some(timeout)).await
    }
}

impl Execute for TransactionReceiptQuery {
    type Response = TransactionReceipt;

    fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    fn make_request(&self, _node_account_id: AccountId) -> Result<Vec<u8>> {
        let transaction_id = self.transaction_id.ok_or_else(|| {
            Error::Validation("receipt query requires a transaction id".to_string())
        })?;

        Ok(RequestEnvelope::Query(QueryPayload::Receipt { transaction_id }).to_array())
    }

    fn should_retry_status(&self, status: Status) -> bool {
        matches!(status, Status::Unknown | Status::ReceiptNotFound)
    }

    fn should_retry_response(&self, response: &ResponseEnvelope) -> bool {
        // The precheck was Ok but the receipt itself may still be pending.
        TransactionReceipt::from_array(&response.body)
            .map(|receipt| receipt.status == Status::Unknown)
            .unwrap_or(false)
    }

    fn make_response(
        &self,
        response: ResponseEnvelope,
        _node_account_id: AccountId,
    ) -> Result<Self::Response> {
        Ok(TransactionReceipt::from_array(&response.body)?)
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

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::Timestamp;

    fn query() -> TransactionReceiptQuery {
        let mut query = TransactionReceiptQuery::new();
        query.set_transaction_id(TransactionId::new(AccountId::new(2), Timestamp::new(9, 0)));
        query
    }

    #[test]
    fn test_make_request_requires_transaction_id() {
        let empty = TransactionReceiptQuery::new();
        assert!(matches!(
            empty.make_request(AccountId::new(3)),
            Err(Error::Validation(_))
        ));
        assert!(query().make_request(AccountId::new(3)).is_ok());
    }

    #[test]
    fn test_not_yet_known_statuses_retry() {
        let query = query();
        assert!(query.should_retry_status(Status::Unknown));
        assert!(query.should_retry_status(Status::ReceiptNotFound));
        assert!(!query.should_retry_status(Status::RecordNotFound));
        assert!(!query.should_retry_status(Status::InvalidSignature));
    }

    #[test]
    fn test_pending_receipt_retries_despite_ok_precheck() {
        let pending = TransactionReceipt {
            status: Status::Unknown,
            account_id: None,
            blob_id: None,
        };
        let response = ResponseEnvelope::with_body(Status::Ok, &pending);
        assert!(query().should_retry_response(&response));

        let terminal = TransactionReceipt {
            status: Status::Ok,
            account_id: None,
            blob_id: Some(4),
        };
        let response = ResponseEnvelope::with_body(Status::Ok, &terminal);
        assert!(!query().should_retry_response(&response));
    }

    #[test]
    fn test_make_response_decodes_receipt() {
        let receipt = TransactionReceipt {
            status: Status::Ok,
            account_id: Some(AccountId::new(42)),
            blob_id: None,
        };
        let response = ResponseEnvelope::with_body(Status::Ok, &receipt);

        let decoded = query().make_response(response, AccountId::new(3)).unwrap();
        assert_eq!(decoded, receipt);
    }
}
