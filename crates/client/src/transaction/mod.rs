//! Transaction building, freezing, and signature assembly.
//!
//! A [`Transaction`] is a mutable builder. Freezing it fixes the structural
//! payload (the transaction id, the candidate nodes, the serialized body
//! per node) and yields a [`FrozenTransaction`], on which the only
//! remaining mutation is growing the signature set. Frozen bytes round-trip
//! through [`FrozenTransaction::to_bytes`]/[`FrozenTransaction::from_bytes`]
//! so a second signer in another process can add its signature without
//! disturbing the first one.

mod chunked;
mod response;

pub use chunked::{BlobUploadTransaction, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS};
pub use response::TransactionResponse;

use std::time::Duration;

use meridian_core::io::{helper, BinaryWriter, IoError, MemoryReader, Serializable, SerializableExt};
use meridian_core::{AccountId, Error, Result, TransactionId};
use meridian_crypto::{sha384, PrivateKey, PublicKey, Signature};

use crate::execute::{execute_any, Execute};
use crate::protocol::{
    ChunkInfo, RequestEnvelope, ResponseEnvelope, SignedTransaction, TransactionBody,
    TransactionPayload, MAX_MEMO_BYTES, MAX_NODES_PER_TRANSACTION,
};
use crate::Client;

/// Default fee ceiling a transaction authorizes, in base units.
pub const DEFAULT_MAX_FEE: u64 = 200_000_000;

/// Default window after `valid_start` during which a transaction may reach
/// consensus.
pub const DEFAULT_VALID_DURATION: Duration = Duration::from_secs(120);

const FROZEN_FORMAT_VERSION: u8 = 1;

/// Mutable transaction builder.
#[derive(Debug, Clone)]
pub struct Transaction {
    payload: TransactionPayload,
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    valid_duration: Duration,
    max_fee: Option<u64>,
    memo: String,
    chunk_info: Option<ChunkInfo>,
    max_attempts: Option<u32>,
    min_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    /// Set on first freeze; makes repeated freezing idempotent and the
    /// structural setters reject further mutation.
    frozen: Option<FrozenTransaction>,
}

impl Transaction {
    pub fn new(payload: TransactionPayload) -> Self {
        Self {
            payload,
            transaction_id: None,
            node_account_ids: None,
            valid_duration: DEFAULT_VALID_DURATION,
            max_fee: None,
            memo: String::new(),
            chunk_info: None,
            max_attempts: None,
            min_backoff: None,
            max_backoff: None,
            frozen: None,
        }
    }

    /// A plain value transfer.
    pub fn transfer(sender: AccountId, recipient: AccountId, amount: u64) -> Self {
        Self::new(TransactionPayload::Transfer {
            sender,
            recipient,
            amount,
        })
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    pub fn node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    fn require_not_frozen(&self) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::Signature(
                "transaction is immutable once frozen".to_string(),
            ));
        }
        Ok(())
    }

    /// Pins the logical operation id.
    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.transaction_id = Some(transaction_id);
        Ok(self)
    }

    /// Pins the candidate node set, bypassing selection.
    pub fn set_node_account_ids(&mut self, node_account_ids: Vec<AccountId>) -> Result<&mut Self> {
        self.require_not_frozen()?;
        if node_account_ids.is_empty() {
            return Err(Error::Validation(
                "node account id list must not be empty".to_string(),
            ));
        }
        self.node_account_ids = Some(node_account_ids);
        Ok(self)
    }

    pub fn set_valid_duration(&mut self, valid_duration: Duration) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.valid_duration = valid_duration;
        Ok(self)
    }

    pub fn set_max_fee(&mut self, max_fee: u64) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.max_fee = Some(max_fee);
        Ok(self)
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.require_not_frozen()?;
        let memo = memo.into();
        if memo.len() > MAX_MEMO_BYTES {
            return Err(Error::Validation(format!(
                "memo of {} bytes exceeds the {MAX_MEMO_BYTES} byte limit",
                memo.len()
            )));
        }
        self.memo = memo;
        Ok(self)
    }

    pub(crate) fn set_chunk_info(&mut self, chunk_info: ChunkInfo) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.chunk_info = Some(chunk_info);
        Ok(self)
    }

    pub fn set_max_attempts(&mut self, max_attempts: u32) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.max_attempts = Some(max_attempts);
        Ok(self)
    }

    pub fn set_min_backoff(&mut self, min_backoff: Duration) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.min_backoff = Some(min_backoff);
        Ok(self)
    }

    pub fn set_max_backoff(&mut self, max_backoff: Duration) -> Result<&mut Self> {
        self.require_not_frozen()?;
        self.max_backoff = Some(max_backoff);
        Ok(self)
    }

    /// Freezes using only explicitly set fields.
    pub fn freeze(&mut self) -> Result<FrozenTransaction> {
        self.freeze_with(None)
    }

    /// Freezes the structural payload, filling the transaction id from the
    /// client's operator and the node set from healthy-node selection when
    /// they were not set explicitly.
    ///
    /// Freezing an already-frozen transaction returns the identical frozen
    /// value; it is a no-op, not an error.
    pub fn freeze_with(&mut self, client: Option<&Client>) -> Result<FrozenTransaction> {
        if let Some(frozen) = &self.frozen {
            return Ok(frozen.clone());
        }

        let transaction_id = match self.transaction_id {
            Some(id) => id,
            None => {
                let operator = client.and_then(Client::operator_account_id).ok_or_else(|| {
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
                let client = client.ok_or_else(|| {
                    Error::Validation(
                        "node account ids must be set, or a client provided".to_string(),
                    )
                })?;
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

        if node_account_ids.len() > MAX_NODES_PER_TRANSACTION {
            return Err(Error::Validation(format!(
                "transaction frozen for {} nodes exceeds the limit of {MAX_NODES_PER_TRANSACTION}",
                node_account_ids.len()
            )));
        }

        let max_fee = self.max_fee.unwrap_or(DEFAULT_MAX_FEE);
        let signed = node_account_ids
            .iter()
            .map(|node_account_id| {
                let body = TransactionBody {
                    transaction_id,
                    node_account_id: *node_account_id,
                    valid_duration_seconds: self.valid_duration.as_secs(),
                    max_fee,
                    memo: self.memo.clone(),
                    chunk_info: self.chunk_info,
                    payload: self.payload.clone(),
                };
                SignedTransaction::new(body.to_array())
            })
            .collect();

        let frozen = FrozenTransaction {
            transaction_id,
            node_account_ids: node_account_ids.clone(),
            signed,
            max_attempts: self.max_attempts,
            min_backoff: self.min_backoff,
            max_backoff: self.max_backoff,
        };

        self.transaction_id = Some(transaction_id);
        self.node_account_ids = Some(node_account_ids);
        self.frozen = Some(frozen.clone());

        Ok(frozen)
    }

    /// Freezes, signs with the client's operator, and submits.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionResponse> {
        let mut frozen = self.freeze_with(Some(client))?;
        if let Some(operator) = client.operator() {
            frozen.sign(&operator.private_key);
        }
        execute_any(client, &frozen, None).await
    }
}

/// A transaction whose structural fields are fixed.
///
/// Only the signature maps may still grow. Execution overrides
/// (`max_attempts` and friends) travel with the value but are client-side
/// preferences: they are not serialized and do not participate in equality.
#[derive(Debug, Clone)]
pub struct FrozenTransaction {
    transaction_id: TransactionId,
    node_account_ids: Vec<AccountId>,
    /// One signed body per candidate node, parallel to `node_account_ids`.
    signed: Vec<SignedTransaction>,
    max_attempts: Option<u32>,
    min_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
}

impl PartialEq for FrozenTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_id == other.transaction_id
            && self.node_account_ids == other.node_account_ids
            && self.signed == other.signed
    }
}

impl Eq for FrozenTransaction {}

impl FrozenTransaction {
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn node_account_ids(&self) -> &[AccountId] {
        &self.node_account_ids
    }

    /// Public keys that have signed so far.
    pub fn signer_public_keys(&self) -> Vec<PublicKey> {
        self.signed
            .first()
            .map(|signed| signed.signatures.public_keys().copied().collect())
            .unwrap_or_default()
    }

    /// Signs every per-node body with `private_key`.
    ///
    /// Signing again with the same key replaces its entries; the final
    /// signature set is identical either way.
    pub fn sign(&mut self, private_key: &PrivateKey) -> &mut Self {
        let public_key = private_key.public_key();
        self.sign_with(public_key, |bytes| private_key.sign(bytes))
    }

    /// Signs every per-node body with an opaque signer capability.
    pub fn sign_with<F>(&mut self, public_key: PublicKey, signer: F) -> &mut Self
    where
        F: Fn(&[u8]) -> Signature,
    {
        for signed in &mut self.signed {
            let signature = signer(&signed.body_bytes);
            signed.signatures.insert(public_key, signature);
        }
        self
    }

    /// Attaches an externally produced signature.
    ///
    /// Only valid on a transaction frozen for exactly one node: with more
    /// candidate bodies there is no way to know which bytes were signed.
    /// The signature is verified against the body before it is accepted.
    pub fn add_signature(&mut self, public_key: PublicKey, signature: Signature) -> Result<&mut Self> {
        if self.signed.len() != 1 {
            return Err(Error::Signature(format!(
                "add_signature requires a transaction frozen for exactly one node, found {}",
                self.signed.len()
            )));
        }

        let signed = &mut self.signed[0];
        public_key.verify(&signed.body_bytes, &signature)?;
        signed.signatures.insert(public_key, signature);
        Ok(self)
    }

    /// SHA-384 hash of the signed bytes submitted to `node_account_id`.
    fn hash_for(&self, index: usize) -> Vec<u8> {
        sha384(&self.signed[index].to_array()).to_vec()
    }

    /// SHA-384 hash of the signed bytes for the first candidate node.
    pub fn transaction_hash(&self) -> Vec<u8> {
        self.hash_for(0)
    }

    /// Serializes the frozen structure plus all collected signatures.
    ///
    /// The output is deterministic: serializing, deserializing, and
    /// serializing again yields identical bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_u8(FROZEN_FORMAT_VERSION);
        self.transaction_id.serialize(&mut writer);
        helper::serialize_array(&self.node_account_ids, &mut writer);
        helper::serialize_array(&self.signed, &mut writer);
        writer.into_bytes()
    }

    /// Restores a frozen transaction from [`Self::to_bytes`] output.
    ///
    /// The per-node bodies are cross-checked against the envelope fields so
    /// bytes reshuffled by an untrusted intermediary are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = MemoryReader::new(bytes);

        let version = reader.read_u8()?;
        if version != FROZEN_FORMAT_VERSION {
            return Err(Error::Io(IoError::InvalidData(format!(
                "unsupported frozen transaction version {version}"
            ))));
        }

        let transaction_id = TransactionId::deserialize(&mut reader)?;
        let node_account_ids: Vec<AccountId> =
            helper::deserialize_array(&mut reader, MAX_NODES_PER_TRANSACTION)?;
        let signed: Vec<SignedTransaction> =
            helper::deserialize_array(&mut reader, MAX_NODES_PER_TRANSACTION)?;

        if reader.remaining() != 0 {
            return Err(Error::Io(IoError::InvalidData(
                "trailing bytes after frozen transaction".to_string(),
            )));
        }
        if node_account_ids.is_empty() || node_account_ids.len() != signed.len() {
            return Err(Error::Io(IoError::InvalidData(
                "node list and body list do not match".to_string(),
            )));
        }

        for (node_account_id, signed) in node_account_ids.iter().zip(&signed) {
            let body = signed.body()?;
            if body.node_account_id != *node_account_id || body.transaction_id != transaction_id {
                return Err(Error::Io(IoError::InvalidData(
                    "transaction body does not match its envelope".to_string(),
                )));
            }
        }

        Ok(Self {
            transaction_id,
            node_account_ids,
            signed,
            max_attempts: None,
            min_backoff: None,
            max_backoff: None,
        })
    }

    /// Submits through the execution engine.
    pub async fn execute(&self, client: &Client) -> Result<TransactionResponse> {
        execute_any(client, self, None).await
    }

    /// Submits with an overall wall-clock budget.
    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionResponse> {
        execute_any(client, self, Some(timeout)).await
    }
}

impl Execute for FrozenTransaction {
    type Response = TransactionResponse;

    fn transaction_id(&self) -> Option<TransactionId> {
        Some(self.transaction_id)
    }

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        Some(&self.node_account_ids)
    }

    fn make_request(&self, node_account_id: AccountId) -> Result<Vec<u8>> {
        let index = self
            .node_account_ids
            .iter()
            .position(|id| *id == node_account_id)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "transaction is not frozen for node {node_account_id}"
                ))
            })?;

        Ok(RequestEnvelope::Transaction(self.signed[index].clone()).to_array())
    }

    fn make_response(
        &self,
        _response: ResponseEnvelope,
        node_account_id: AccountId,
    ) -> Result<Self::Response> {
        let index = self
            .node_account_ids
            .iter()
            .position(|id| *id == node_account_id)
            .unwrap_or(0);

        Ok(TransactionResponse {
            transaction_id: self.transaction_id,
            node_account_id,
            transaction_hash: self.hash_for(index),
        })
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
