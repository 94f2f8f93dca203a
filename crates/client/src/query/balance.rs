//! Account balance query.

use std::time::Duration;

use meridian_core::io::SerializableExt;
use meridian_core::{AccountId, Error, Result, TransactionId};

use crate::execute::{execute_any, Execute};
use crate::protocol::{AccountBalance, QueryPayload, RequestEnvelope, ResponseEnvelope};
use crate::Client;

/// Asks any node for the current balance of an account.
///
/// Balances are free queries: no transaction id, no payment, no polling.
#[derive(Debug, Clone, Default)]
pub struct AccountBalanceQuery {
    account_id: Option<AccountId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_attempts: Option<u32>,
}

impl AccountBalanceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account_id(&mut self, account_id: AccountId) -> &mut Self {
        self.account_id = Some(account_id);
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

    pub async fn execute(&self, client: &Client) -> Result<AccountBalance> {
        execute_any(client, self, None).await
    }

    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: Duration,
    ) -> Result<AccountBalance> {
        execute_any(client, self, Some(timeout)).await
    }
}

impl Execute for AccountBalanceQuery {
    type Response = AccountBalance;

    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    fn make_request(&self, _node_account_id: AccountId) -> Result<Vec<u8>> {
        let account_id = self.account_id.ok_or_else(|| {
            Error::Validation("balance query requires an account id".to_string())
        })?;

        Ok(RequestEnvelope::Query(QueryPayload::Balance { account_id }).to_array())
    }

    fn make_response(
        &self,
        response: ResponseEnvelope,
        _node_account_id: AccountId,
    ) -> Result<Self::Response> {
        Ok(AccountBalance::from_array(&response.body)?)
    }

    fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}
