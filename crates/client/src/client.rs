//! The client handle.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use meridian_core::{AccountId, Error, Result};
use meridian_crypto::PrivateKey;

use crate::execute::ExecutionConfig;
use crate::network::{AddressBookSource, Network, NodeAddressEntry};
use crate::transport::{HttpTransport, Transport, TransportFault};

/// Delay before the first background address-book refresh.
pub const NETWORK_REFRESH_INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Default interval between background address-book refreshes.
pub const DEFAULT_NETWORK_REFRESH_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// The account that pays for transactions plus the key that signs them.
#[derive(Clone)]
pub struct Operator {
    pub account_id: AccountId,
    pub private_key: PrivateKey,
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

struct ClientInner {
    network: Network,
    transport: Arc<dyn Transport>,
    operator: RwLock<Option<Operator>>,
    execution: RwLock<ExecutionConfig>,
    refresh_period: RwLock<Duration>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.lock().take() {
            task.abort();
        }
    }
}

/// Handle to the Meridian network.
///
/// Cheap to clone; all clones share the node registry, the transport, and
/// the execution defaults. Dropping the last clone stops the background
/// refresh task.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Builds a client for the given nodes using the HTTP transport.
    pub fn for_network(entries: Vec<NodeAddressEntry>) -> Result<Self> {
        let transport = HttpTransport::new().map_err(|TransportFault { message }| {
            Error::Transport {
                address: String::new(),
                message,
            }
        })?;
        Self::for_network_with_transport(entries, Arc::new(transport))
    }

    /// Builds a client with a caller-supplied transport.
    pub fn for_network_with_transport(
        entries: Vec<NodeAddressEntry>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(ClientInner {
                network: Network::new(entries)?,
                transport,
                operator: RwLock::new(None),
                execution: RwLock::new(ExecutionConfig::default()),
                refresh_period: RwLock::new(DEFAULT_NETWORK_REFRESH_PERIOD),
                refresh_task: Mutex::new(None),
            }),
        })
    }

    /// Builds a client from a JSON configuration document:
    ///
    /// ```json
    /// {
    ///     "network": [{"accountId": "0.3", "address": "10.0.0.1:50211"}],
    ///     "operator": {"accountId": "0.2", "privateKey": "<hex seed>"}
    /// }
    /// ```
    pub fn from_json_config(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| Error::Validation(format!("invalid client config: {e}")))?;

        let client = Self::for_network(config.network)?;
        if let Some(operator) = config.operator {
            let private_key: PrivateKey = operator.private_key.parse()?;
            client.set_operator(operator.account_id, private_key);
        }
        Ok(client)
    }

    /// Sets the account that pays for and signs submitted transactions.
    pub fn set_operator(&self, account_id: AccountId, private_key: PrivateKey) -> &Self {
        *self.inner.operator.write() = Some(Operator {
            account_id,
            private_key,
        });
        self
    }

    pub fn operator(&self) -> Option<Operator> {
        self.inner.operator.read().clone()
    }

    pub fn operator_account_id(&self) -> Option<AccountId> {
        self.inner.operator.read().as_ref().map(|op| op.account_id)
    }

    pub fn network(&self) -> &Network {
        &self.inner.network
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Replaces the node set immediately (the foreground counterpart of the
    /// background refresh).
    pub fn set_nodes(&self, entries: Vec<NodeAddressEntry>) -> Result<()> {
        self.inner.network.set_nodes(entries)
    }

    pub(crate) fn execution_config(&self) -> ExecutionConfig {
        *self.inner.execution.read()
    }

    pub fn set_max_attempts(&self, max_attempts: u32) -> &Self {
        self.inner.execution.write().max_attempts = max_attempts.max(1);
        self
    }

    pub fn set_min_backoff(&self, min_backoff: Duration) -> &Self {
        self.inner.execution.write().min_backoff = min_backoff;
        self
    }

    pub fn set_max_backoff(&self, max_backoff: Duration) -> &Self {
        self.inner.execution.write().max_backoff = max_backoff;
        self
    }

    /// Overall wall-clock budget applied to requests that do not set one.
    pub fn set_request_timeout(&self, request_timeout: Duration) -> &Self {
        self.inner.execution.write().request_timeout = request_timeout;
        self
    }

    pub fn set_max_nodes_per_request(&self, max: usize) -> &Self {
        self.inner.network.set_max_nodes_per_request(max);
        self
    }

    /// Changes how often the background refresh re-fetches the address
    /// book. Takes effect from the next tick.
    pub fn set_network_refresh_period(&self, period: Duration) -> &Self {
        *self.inner.refresh_period.write() = period;
        self
    }

    pub fn network_refresh_period(&self) -> Duration {
        *self.inner.refresh_period.read()
    }

    /// Starts (or restarts) the background address-book refresh.
    ///
    /// The task first fires after a fixed startup delay, then on every
    /// refresh period. A failed fetch leaves the current snapshot in place
    /// and is only logged; it is never surfaced to in-flight requests.
    pub fn start_network_refresh(&self, source: Arc<dyn AddressBookSource>) -> &Self {
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(refresh_loop(weak, source));

        if let Some(previous) = self.inner.refresh_task.lock().replace(task) {
            previous.abort();
        }
        self
    }

    /// Stops the background refresh, if one is running.
    pub fn stop_network_refresh(&self) -> &Self {
        if let Some(task) = self.inner.refresh_task.lock().take() {
            task.abort();
        }
        self
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("network", &self.inner.network)
            .field("operator", &self.operator_account_id())
            .finish_non_exhaustive()
    }
}

async fn refresh_loop(inner: Weak<ClientInner>, source: Arc<dyn AddressBookSource>) {
    tokio::time::sleep(NETWORK_REFRESH_INITIAL_DELAY).await;

    loop {
        // Holding only a weak handle lets the client (and this task's
        // reason to exist) go away while we sleep.
        let Some(inner) = inner.upgrade() else {
            return;
        };

        match source.fetch().await {
            Ok(entries) => match inner.network.set_nodes(entries) {
                Ok(()) => {
                    debug!(version = inner.network.version(), "address book refreshed");
                }
                Err(error) => {
                    warn!(%error, "address book refresh produced an unusable node list");
                }
            },
            Err(error) => {
                warn!(%error, "address book fetch failed; keeping current network");
            }
        }

        let period = *inner.refresh_period.read();
        drop(inner);
        tokio::time::sleep(period).await;
    }
}

#[derive(Deserialize)]
struct ClientConfig {
    network: Vec<NodeAddressEntry>,
    #[serde(default)]
    operator: Option<OperatorConfig>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperatorConfig {
    account_id: AccountId,
    private_key: String,
}
