//! Opaque byte transport to a network node.
//!
//! The engine hands a transport an address and serialized request bytes and
//! gets response bytes back; everything else (protocol, pooling, TLS) is
//! the implementation's business. Implementations must not retry
//! internally; retry and failover belong to the execution engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// A transport-level failure: the node could not be reached, or did not
/// answer within the deadline. Always retryable against another node.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportFault {
    pub message: String,
}

impl TransportFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends one opaque request to one node and returns its answer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Calls `address` with `request`, waiting at most `deadline`.
    ///
    /// A `deadline` of `None` leaves the implementation's own limit in
    /// force. Cancelling the returned future abandons (not aborts) the
    /// underlying call.
    async fn call(
        &self,
        address: &str,
        request: &[u8],
        deadline: Option<Duration>,
    ) -> Result<Vec<u8>, TransportFault>;
}

/// HTTP transport: POSTs request bytes to the node's endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportFault> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportFault::new(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }

    /// Uses an existing reqwest client (shared pools, custom TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn endpoint(address: &str) -> Result<Url, TransportFault> {
        let raw = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        Url::parse(&raw).map_err(|e| TransportFault::new(format!("invalid node address `{address}`: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        address: &str,
        request: &[u8],
        deadline: Option<Duration>,
    ) -> Result<Vec<u8>, TransportFault> {
        let url = Self::endpoint(address)?;

        let mut builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(request.to_vec());

        if let Some(deadline) = deadline {
            builder = builder.timeout(deadline);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportFault::new(format!("request to {address} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFault::new(format!(
                "node {address} answered http {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportFault::new(format!("reading response from {address} failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}
