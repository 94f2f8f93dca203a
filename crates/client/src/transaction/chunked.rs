//! Chunked blob upload.
//!
//! A payload larger than one request's size limit is split into an ordered
//! sequence of dependent sub-transactions: chunk 0 creates the blob, chunks
//! `1..N` append to it, and every chunk's id derives deterministically from
//! the base id. Chunks are submitted strictly sequentially, chunk `i + 1`
//! going out only after chunk `i`'s receipt reached a terminal state,
//! because an append is only meaningful once its predecessor was accepted.
//!
//! Cancelling mid-sequence cannot un-submit chunks the ledger already
//! accepted; a caller that gives up after chunk `i` owns chunks `0..=i`.

use std::time::Duration;

use tracing::debug;

use meridian_core::{AccountId, Error, Result, TransactionId};

use crate::protocol::{ChunkInfo, TransactionPayload};
use crate::transaction::{Transaction, TransactionResponse};
use crate::Client;

/// Default payload bytes per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default ceiling on the number of chunks for one logical operation.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Uploads an arbitrarily large blob as a chunk sequence.
#[derive(Debug, Clone)]
pub struct BlobUploadTransaction {
    contents: Vec<u8>,
    chunk_size: usize,
    max_chunks: usize,
    memo: String,
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_attempts: Option<u32>,
    min_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
}

impl Default for BlobUploadTransaction {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobUploadTransaction {
    pub fn new() -> Self {
        Self {
            contents: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            memo: String::new(),
            transaction_id: None,
            node_account_ids: None,
            max_attempts: None,
            min_backoff: None,
            max_backoff: None,
        }
    }

    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) -> &mut Self {
        self.contents = contents.into();
        self
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<&mut Self> {
        if chunk_size == 0 {
            return Err(Error::Validation("chunk size must be non-zero".to_string()));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn set_max_chunks(&mut self, max_chunks: usize) -> Result<&mut Self> {
        if max_chunks == 0 {
            return Err(Error::Validation("max chunks must be non-zero".to_string()));
        }
        self.max_chunks = max_chunks;
        Ok(self)
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.memo = memo.into();
        self
    }

    /// Pins the base id the whole chunk sequence derives from.
    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> &mut Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Pins the candidate node set used by every chunk.
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

    /// How many chunks the current contents split into.
    ///
    /// Empty contents still produce one (bare create) chunk.
    pub fn chunk_count(&self) -> usize {
        if self.contents.is_empty() {
            1
        } else {
            self.contents.len().div_ceil(self.chunk_size)
        }
    }

    fn chunk_slices(&self) -> Vec<&[u8]> {
        if self.contents.is_empty() {
            vec![&[]]
        } else {
            self.contents.chunks(self.chunk_size).collect()
        }
    }

    /// Rejects the upload before submission when it cannot fit the chunk
    /// budget. This is a hard validation error, never retried.
    pub fn validate(&self) -> Result<()> {
        let required = self.chunk_count();
        if required > self.max_chunks {
            return Err(Error::Validation(format!(
                "contents of {} bytes require {required} chunks of {} bytes, \
                 exceeding the limit of {} chunks",
                self.contents.len(),
                self.chunk_size,
                self.max_chunks
            )));
        }
        Ok(())
    }

    /// Submits every chunk in order and returns all responses.
    ///
    /// Each chunk must reach a successful receipt before the next one is
    /// submitted; a failed chunk aborts the remainder with its error.
    pub async fn execute_all(&self, client: &Client) -> Result<Vec<TransactionResponse>> {
        self.validate()?;

        let base_id = match self.transaction_id {
            Some(id) => id,
            None => {
                let operator = client.operator_account_id().ok_or_else(|| {
                    Error::Validation(
                        "transaction id must be set, or a client with an operator provided"
                            .to_string(),
                    )
                })?;
                TransactionId::generate(operator)
            }
        };

        let node_account_ids = match &self.node_account_ids {
            Some(ids) => ids.clone(),
            None => {
                let selected = client
                    .network()
                    .select(&Default::default(), client.network().nodes_per_request());
                if selected.is_empty() {
                    return Err(Error::Validation(
                        "network contains no usable nodes".to_string(),
                    ));
                }
                selected
            }
        };

        let slices = self.chunk_slices();
        let total = slices.len() as u32;
        let mut responses = Vec::with_capacity(slices.len());

        for (index, slice) in slices.into_iter().enumerate() {
            let payload = if index == 0 {
                TransactionPayload::BlobCreate {
                    contents: slice.to_vec(),
                }
            } else {
                TransactionPayload::BlobAppend {
                    contents: slice.to_vec(),
                }
            };

            let mut chunk = Transaction::new(payload);
            chunk
                .set_transaction_id(TransactionId::chunk_derived(base_id, index))?
                .set_node_account_ids(node_account_ids.clone())?
                .set_memo(self.memo.clone())?
                .set_chunk_info(ChunkInfo {
                    initial_transaction_id: base_id,
                    index: index as u32,
                    total,
                })?;
            if let Some(max_attempts) = self.max_attempts {
                chunk.set_max_attempts(max_attempts)?;
            }
            if let Some(min_backoff) = self.min_backoff {
                chunk.set_min_backoff(min_backoff)?;
            }
            if let Some(max_backoff) = self.max_backoff {
                chunk.set_max_backoff(max_backoff)?;
            }

            debug!(chunk = index, total, base = %base_id, "submitting chunk");
            let response = chunk.execute(client).await?;

            // The receipt gate: the next chunk may only go out once this
            // one reached a terminal, successful outcome.
            response.get_receipt(client).await?;

            responses.push(response);
        }

        Ok(responses)
    }

    /// Submits every chunk and returns the last chunk's response as the
    /// logical operation's outcome.
    pub async fn execute(&self, client: &Client) -> Result<TransactionResponse> {
        let mut responses = self.execute_all(client).await?;
        responses.pop().ok_or_else(|| {
            Error::Validation("chunked upload produced no responses".to_string())
        })
    }
}
