//! The attempt-and-backoff execution engine.
//!
//! Every request this SDK sends (transaction submission, receipt polling,
//! plain queries) funnels through [`execute_any`], which owns node
//! selection, failover, backoff, the overall deadline, and the
//! classification of wire statuses into retry/fail/success.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use meridian_core::io::SerializableExt;
use meridian_core::{AccountId, Error, Result, Status, TransactionId};

use crate::network::now_millis;
use crate::protocol::ResponseEnvelope;
use crate::Client;

/// Largest attempt exponent applied to the engine backoff base.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Client-level execution defaults, overridable per request.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionConfig {
    /// Hard cap on attempts for one logical request.
    pub max_attempts: u32,
    /// First retry delay; doubles every retry.
    pub min_backoff: Duration,
    /// Ceiling for the retry delay.
    pub max_backoff: Duration,
    /// Overall wall-clock budget for one logical request.
    pub request_timeout: Duration,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Classification of one attempt's result.
enum ExecutionOutcome<R> {
    Success(R),
    Retry(Error),
    Fail(Error),
}

/// A request the execution engine can drive to completion.
///
/// Implementations are data: the engine calls `make_request` once per
/// attempt (the serialized bytes may depend on the target node, never on
/// the attempt number) and maps the node's answer back through the
/// `make_*`/`should_retry_*` hooks.
pub trait Execute: Send + Sync {
    type Response: Send;

    /// The logical operation id, when the request carries one.
    fn transaction_id(&self) -> Option<TransactionId>;

    /// Explicit candidate nodes. `None` lets the engine pick healthy nodes
    /// from the network per attempt.
    fn node_account_ids(&self) -> Option<&[AccountId]>;

    /// Serializes the request for submission to `node_account_id`.
    fn make_request(&self, node_account_id: AccountId) -> Result<Vec<u8>>;

    /// Extra statuses (beyond the always-transient set) that mean "ask
    /// again later" for this request kind.
    fn should_retry_status(&self, _status: Status) -> bool {
        false
    }

    /// Whether an `Ok`-status response still needs retrying (e.g. a receipt
    /// that exists but has not reached a terminal state).
    fn should_retry_response(&self, _response: &ResponseEnvelope) -> bool {
        false
    }

    /// Builds the caller-visible response from a successful answer.
    fn make_response(
        &self,
        response: ResponseEnvelope,
        node_account_id: AccountId,
    ) -> Result<Self::Response>;

    /// The error representing a rejection with `status` from `node_account_id`.
    fn make_status_error(&self, status: Status, node_account_id: AccountId) -> Error {
        Error::Status {
            status,
            transaction_id: self.transaction_id(),
            node_account_id,
        }
    }

    /// The error recorded when `should_retry_response` asked for a retry.
    fn retry_response_error(&self, node_account_id: AccountId) -> Error {
        self.make_status_error(Status::Unknown, node_account_id)
    }

    /// Per-request override of [`ExecutionConfig::max_attempts`].
    fn max_attempts(&self) -> Option<u32> {
        None
    }

    /// Per-request override of [`ExecutionConfig::min_backoff`].
    fn min_backoff(&self) -> Option<Duration> {
        None
    }

    /// Per-request override of [`ExecutionConfig::max_backoff`].
    fn max_backoff(&self) -> Option<Duration> {
        None
    }
}

/// Drives `executable` to a terminal outcome against the client's network.
///
/// `timeout` overrides the client's request timeout as the overall
/// wall-clock budget; its expiry surfaces [`Error::Timeout`] regardless of
/// remaining attempts.
pub async fn execute_any<E: Execute>(
    client: &Client,
    executable: &E,
    timeout: Option<Duration>,
) -> Result<E::Response> {
    let config = client.execution_config();
    let max_attempts = executable.max_attempts().unwrap_or(config.max_attempts).max(1);
    let min_backoff = executable.min_backoff().unwrap_or(config.min_backoff);
    let max_backoff = executable.max_backoff().unwrap_or(config.max_backoff);
    let deadline = Instant::now() + timeout.unwrap_or(config.request_timeout);

    let explicit: Option<Vec<AccountId>> = executable.node_account_ids().map(<[_]>::to_vec);
    if let Some(ids) = &explicit {
        if ids.is_empty() {
            return Err(Error::Validation(
                "an explicit node list must not be empty".to_string(),
            ));
        }
    }

    let network = client.network();
    let mut last_error: Option<Error> = None;
    let mut previous_node: Option<AccountId> = None;

    for attempt in 1..=max_attempts {
        if Instant::now() >= deadline {
            return Err(Error::timed_out(last_error.as_ref()));
        }

        // An explicit list bypasses selection and is walked round-robin;
        // otherwise each attempt asks the network for a fresh healthy node,
        // preferring one other than the node that just disappointed us.
        let node_account_id = match &explicit {
            Some(ids) => ids[(attempt as usize - 1) % ids.len()],
            None => {
                let mut excluding = HashSet::new();
                if let Some(previous) = previous_node {
                    excluding.insert(previous);
                }
                match network.select(&excluding, 1).first() {
                    Some(id) => *id,
                    None => {
                        return Err(Error::Validation(
                            "network contains no usable nodes".to_string(),
                        ))
                    }
                }
            }
        };
        previous_node = Some(node_account_id);

        let node = match network.node(&node_account_id) {
            Some(node) => node,
            None => {
                // Removed by a concurrent refresh; burn the attempt and
                // re-resolve.
                last_error = Some(Error::Validation(format!(
                    "node {node_account_id} is no longer part of the network"
                )));
                continue;
            }
        };

        // Selection never hands out a backed-off node unless every node is
        // backed off (or the caller pinned one explicitly); in both cases
        // the right move is to wait out the window, not to fail.
        let now = now_millis();
        if !node.is_healthy(now) {
            let wait = Duration::from_millis(node.remaining_backoff(now));
            sleep_within_deadline(deadline, wait, last_error.as_ref()).await?;
        }

        let request = executable.make_request(node_account_id)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::timed_out(last_error.as_ref()));
        }

        debug!(
            attempt,
            max_attempts,
            node = %node_account_id,
            address = node.address(),
            "issuing request"
        );

        let outcome = match client
            .transport()
            .call(node.address(), &request, Some(remaining))
            .await
        {
            Err(fault) => {
                node.record_failure(min_backoff, max_backoff);
                ExecutionOutcome::Retry(Error::Transport {
                    address: node.address().to_string(),
                    message: fault.message,
                })
            }
            Ok(bytes) => {
                // The node answered: it is reachable and serving, whatever
                // it thought of this particular request.
                node.record_success();
                match ResponseEnvelope::from_array(&bytes) {
                    Ok(envelope) => classify(executable, envelope, node_account_id),
                    Err(e) => ExecutionOutcome::Fail(Error::Io(e)),
                }
            }
        };

        match outcome {
            ExecutionOutcome::Success(response) => return Ok(response),
            ExecutionOutcome::Fail(error) => return Err(error),
            ExecutionOutcome::Retry(error) => {
                debug!(attempt, error = %error, "attempt failed, will retry");
                last_error = Some(error);

                if attempt < max_attempts {
                    let delay = engine_backoff(min_backoff, max_backoff, attempt);
                    sleep_within_deadline(deadline, delay, last_error.as_ref()).await?;
                }
            }
        }
    }

    Err(Error::timed_out(last_error.as_ref()))
}

/// Total mapping of a wire answer into an outcome.
fn classify<E: Execute>(
    executable: &E,
    envelope: ResponseEnvelope,
    node_account_id: AccountId,
) -> ExecutionOutcome<E::Response> {
    let status = envelope.status;

    if status == Status::Ok {
        if executable.should_retry_response(&envelope) {
            return ExecutionOutcome::Retry(executable.retry_response_error(node_account_id));
        }
        return match executable.make_response(envelope, node_account_id) {
            Ok(response) => ExecutionOutcome::Success(response),
            Err(error) => ExecutionOutcome::Fail(error),
        };
    }

    if status.is_transient() || executable.should_retry_status(status) {
        return ExecutionOutcome::Retry(executable.make_status_error(status, node_account_id));
    }

    ExecutionOutcome::Fail(executable.make_status_error(status, node_account_id))
}

/// Delay before attempt `attempt + 1`: `min * 2^(attempt-1)`, capped.
fn engine_backoff(min_backoff: Duration, max_backoff: Duration, attempt: u32) -> Duration {
    let millis = (min_backoff.as_millis() as u64)
        .saturating_mul(1u64 << (attempt - 1).min(MAX_BACKOFF_EXPONENT))
        .min(max_backoff.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Sleeps for `delay` unless that would cross the overall deadline, in
/// which case the pending retry is converted into a timeout now.
async fn sleep_within_deadline(
    deadline: Instant,
    delay: Duration,
    last_error: Option<&Error>,
) -> Result<()> {
    if Instant::now() + delay >= deadline {
        return Err(Error::timed_out(last_error));
    }
    sleep(delay).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_backoff_doubles_from_min() {
        let min = Duration::from_millis(250);
        let max = Duration::from_secs(8);

        assert_eq!(engine_backoff(min, max, 1), Duration::from_millis(250));
        assert_eq!(engine_backoff(min, max, 2), Duration::from_millis(500));
        assert_eq!(engine_backoff(min, max, 3), Duration::from_millis(1000));
        assert_eq!(engine_backoff(min, max, 4), Duration::from_millis(2000));
    }

    #[test]
    fn test_engine_backoff_caps_at_max() {
        let min = Duration::from_millis(250);
        let max = Duration::from_secs(8);

        assert_eq!(engine_backoff(min, max, 6), max);
        assert_eq!(engine_backoff(min, max, 60), max);
    }

    #[test]
    fn test_engine_backoff_bounds_property() {
        let min = Duration::from_millis(100);
        let max = Duration::from_secs(4);

        for attempt in 1..=12 {
            let delay = engine_backoff(min, max, attempt);
            let lower = min.as_millis() as u64 * (1u64 << (attempt - 1).min(16));
            assert!(delay.as_millis() as u64 <= max.as_millis() as u64);
            assert!(delay.as_millis() as u64 == lower.min(max.as_millis() as u64));
        }
    }

    #[test]
    fn test_default_execution_config() {
        let config = ExecutionConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.min_backoff, Duration::from_millis(250));
        assert_eq!(config.max_backoff, Duration::from_secs(8));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }
}
