// Copyright (C) 2024-2026 The Meridian Project.
//
// protocol.rs file belongs to the meridian project and is free
// software distributed under the MIT software license, see the
// accompanying file LICENSE in the main directory of the
// repository or http://www.opensource.org/licenses/mit-license.php
// for more details.
//
// Redistribution and use in source and binary forms with or without
// modifications are permitted.

//! Wire messages exchanged with network nodes.
//!
//! The transport itself is opaque; this module defines the envelope the
//! execution engine inspects (a status code and an opaque body) and the
//! closed set of payload variants this SDK submits. Signed transaction
//! bytes must survive round-tripping through untrusted intermediaries,
//! so every encoding here is deterministic.

use std::collections::BTreeMap;

use meridian_core::io::{
    BinaryWriter, IoError, IoResult, MemoryReader, Serializable, SerializableExt,
};
use meridian_core::{AccountId, Status, Timestamp, TransactionId};
use meridian_crypto::{PublicKey, Signature, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Maximum decoded size of a response or payload body.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// Maximum length of a transaction memo in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

/// Maximum number of candidate nodes a transaction may be frozen for.
pub const MAX_NODES_PER_TRANSACTION: usize = 128;

/// Maximum number of signatures a signed transaction may carry.
pub const MAX_SIGNATURES: usize = 64;

const TAG_REQUEST_TRANSACTION: u8 = 1;
const TAG_REQUEST_QUERY: u8 = 2;

const TAG_PAYLOAD_TRANSFER: u8 = 1;
const TAG_PAYLOAD_BLOB_CREATE: u8 = 2;
const TAG_PAYLOAD_BLOB_APPEND: u8 = 3;

const TAG_QUERY_RECEIPT: u8 = 1;
const TAG_QUERY_RECORD: u8 = 2;
const TAG_QUERY_BALANCE: u8 = 3;

/// Chunk metadata carried by every slice of a chunked operation.
///
/// `initial_transaction_id` is the base id of the logical operation; the
/// ledger uses it to associate appends with the create they extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    pub initial_transaction_id: TransactionId,
    pub index: u32,
    pub total: u32,
}

impl Serializable for ChunkInfo {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.initial_transaction_id.serialize(writer);
        writer.write_u32(self.index);
        writer.write_u32(self.total);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            initial_transaction_id: TransactionId::deserialize(reader)?,
            index: reader.read_u32()?,
            total: reader.read_u32()?,
        })
    }
}

/// The closed set of transaction payloads this SDK submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionPayload {
    /// Moves `amount` from `sender` to `recipient`.
    Transfer {
        sender: AccountId,
        recipient: AccountId,
        amount: u64,
    },
    /// Creates a blob holding the first slice of content.
    BlobCreate { contents: Vec<u8> },
    /// Appends a further slice to the blob created by the chunk sequence's
    /// initial transaction.
    BlobAppend { contents: Vec<u8> },
}

impl TransactionPayload {
    /// Short payload kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::BlobCreate { .. } => "blob-create",
            Self::BlobAppend { .. } => "blob-append",
        }
    }
}

impl Serializable for TransactionPayload {
    fn serialize(&self, writer: &mut BinaryWriter) {
        match self {
            Self::Transfer {
                sender,
                recipient,
                amount,
            } => {
                writer.write_u8(TAG_PAYLOAD_TRANSFER);
                sender.serialize(writer);
                recipient.serialize(writer);
                writer.write_u64(*amount);
            }
            Self::BlobCreate { contents } => {
                writer.write_u8(TAG_PAYLOAD_BLOB_CREATE);
                writer.write_var_bytes(contents);
            }
            Self::BlobAppend { contents } => {
                writer.write_u8(TAG_PAYLOAD_BLOB_APPEND);
                writer.write_var_bytes(contents);
            }
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        match reader.read_u8()? {
            TAG_PAYLOAD_TRANSFER => Ok(Self::Transfer {
                sender: AccountId::deserialize(reader)?,
                recipient: AccountId::deserialize(reader)?,
                amount: reader.read_u64()?,
            }),
            TAG_PAYLOAD_BLOB_CREATE => Ok(Self::BlobCreate {
                contents: reader.read_var_bytes(MAX_BODY_BYTES)?.to_vec(),
            }),
            TAG_PAYLOAD_BLOB_APPEND => Ok(Self::BlobAppend {
                contents: reader.read_var_bytes(MAX_BODY_BYTES)?.to_vec(),
            }),
            tag => Err(IoError::InvalidData(format!("unknown payload tag {tag}"))),
        }
    }
}

/// The structural fields of a transaction, fixed at freeze time.
///
/// One body exists per candidate node; the node account id is part of the
/// signing domain so a signature cannot be replayed against another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
    pub node_account_id: AccountId,
    pub valid_duration_seconds: u64,
    pub max_fee: u64,
    pub memo: String,
    pub chunk_info: Option<ChunkInfo>,
    pub payload: TransactionPayload,
}

impl Serializable for TransactionBody {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.transaction_id.serialize(writer);
        self.node_account_id.serialize(writer);
        writer.write_u64(self.valid_duration_seconds);
        writer.write_u64(self.max_fee);
        writer.write_var_string(&self.memo);
        match &self.chunk_info {
            Some(info) => {
                writer.write_bool(true);
                info.serialize(writer);
            }
            None => writer.write_bool(false),
        }
        self.payload.serialize(writer);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            transaction_id: TransactionId::deserialize(reader)?,
            node_account_id: AccountId::deserialize(reader)?,
            valid_duration_seconds: reader.read_u64()?,
            max_fee: reader.read_u64()?,
            memo: reader.read_var_string(MAX_MEMO_BYTES)?,
            chunk_info: match reader.read_bool()? {
                true => Some(ChunkInfo::deserialize(reader)?),
                false => None,
            },
            payload: TransactionPayload::deserialize(reader)?,
        })
    }
}

/// Signatures attached to one transaction body, keyed by public key.
///
/// Re-signing with a key already present replaces its entry, and the
/// ordered map keeps serialization deterministic regardless of the order
/// signatures arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureMap(BTreeMap<PublicKey, Signature>);

impl SignatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the signature for `public_key`.
    pub fn insert(&mut self, public_key: PublicKey, signature: Signature) {
        self.0.insert(public_key, signature);
    }

    pub fn contains(&self, public_key: &PublicKey) -> bool {
        self.0.contains_key(public_key)
    }

    pub fn get(&self, public_key: &PublicKey) -> Option<&Signature> {
        self.0.get(public_key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn public_keys(&self) -> impl Iterator<Item = &PublicKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PublicKey, &Signature)> {
        self.0.iter()
    }
}

impl Serializable for SignatureMap {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_var_int(self.0.len() as u64);
        for (public_key, signature) in &self.0 {
            writer.write_bytes(public_key.as_bytes());
            writer.write_bytes(signature.as_bytes());
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        let count = reader.read_var_int(MAX_SIGNATURES as u64)?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let public_key = PublicKey::from_bytes(reader.read_bytes(PUBLIC_KEY_LENGTH)?)
                .map_err(|e| IoError::InvalidData(e.to_string()))?;
            let signature = Signature::from_bytes(reader.read_bytes(SIGNATURE_LENGTH)?)
                .map_err(|e| IoError::InvalidData(e.to_string()))?;
            map.insert(public_key, signature);
        }
        Ok(Self(map))
    }
}

/// A serialized transaction body plus the signatures collected over it.
///
/// The body is kept as the exact bytes that were signed; re-encoding the
/// parsed form could legitimately differ byte-for-byte in some future
/// version, and signatures must keep verifying across round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub body_bytes: Vec<u8>,
    pub signatures: SignatureMap,
}

impl SignedTransaction {
    pub fn new(body_bytes: Vec<u8>) -> Self {
        Self {
            body_bytes,
            signatures: SignatureMap::new(),
        }
    }

    /// Decodes the structural body this signed transaction wraps.
    pub fn body(&self) -> IoResult<TransactionBody> {
        TransactionBody::from_array(&self.body_bytes)
    }
}

impl Serializable for SignedTransaction {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.body_bytes);
        self.signatures.serialize(writer);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            body_bytes: reader.read_var_bytes(MAX_BODY_BYTES)?.to_vec(),
            signatures: SignatureMap::deserialize(reader)?,
        })
    }
}

/// The closed set of query payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPayload {
    /// The eventual receipt of a submitted transaction.
    Receipt { transaction_id: TransactionId },
    /// The full record of a submitted transaction.
    Record { transaction_id: TransactionId },
    /// The current balance of an account.
    Balance { account_id: AccountId },
}

impl Serializable for QueryPayload {
    fn serialize(&self, writer: &mut BinaryWriter) {
        match self {
            Self::Receipt { transaction_id } => {
                writer.write_u8(TAG_QUERY_RECEIPT);
                transaction_id.serialize(writer);
            }
            Self::Record { transaction_id } => {
                writer.write_u8(TAG_QUERY_RECORD);
                transaction_id.serialize(writer);
            }
            Self::Balance { account_id } => {
                writer.write_u8(TAG_QUERY_BALANCE);
                account_id.serialize(writer);
            }
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        match reader.read_u8()? {
            TAG_QUERY_RECEIPT => Ok(Self::Receipt {
                transaction_id: TransactionId::deserialize(reader)?,
            }),
            TAG_QUERY_RECORD => Ok(Self::Record {
                transaction_id: TransactionId::deserialize(reader)?,
            }),
            TAG_QUERY_BALANCE => Ok(Self::Balance {
                account_id: AccountId::deserialize(reader)?,
            }),
            tag => Err(IoError::InvalidData(format!("unknown query tag {tag}"))),
        }
    }
}

/// Everything a node accepts over the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEnvelope {
    Transaction(SignedTransaction),
    Query(QueryPayload),
}

impl Serializable for RequestEnvelope {
    fn serialize(&self, writer: &mut BinaryWriter) {
        match self {
            Self::Transaction(signed) => {
                writer.write_u8(TAG_REQUEST_TRANSACTION);
                signed.serialize(writer);
            }
            Self::Query(query) => {
                writer.write_u8(TAG_REQUEST_QUERY);
                query.serialize(writer);
            }
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        match reader.read_u8()? {
            TAG_REQUEST_TRANSACTION => Ok(Self::Transaction(SignedTransaction::deserialize(reader)?)),
            TAG_REQUEST_QUERY => Ok(Self::Query(QueryPayload::deserialize(reader)?)),
            tag => Err(IoError::InvalidData(format!("unknown request tag {tag}"))),
        }
    }
}

/// Every node answer: a status code, then an opaque body.
///
/// The engine inspects only the status; bodies are decoded by the request
/// type that asked for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub status: Status,
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    pub fn status_only(status: Status) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn with_body<T: Serializable>(status: Status, body: &T) -> Self {
        Self {
            status,
            body: body.to_array(),
        }
    }
}

impl Serializable for ResponseEnvelope {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_i32(self.status.code());
        writer.write_var_bytes(&self.body);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            status: Status::from_code(reader.read_i32()?),
            body: reader.read_var_bytes(MAX_BODY_BYTES)?.to_vec(),
        })
    }
}

/// The eventual outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Terminal status of the operation, or [`Status::Unknown`] while the
    /// network has not yet reached consensus on it.
    pub status: Status,
    /// Account created by the operation, when it created one.
    pub account_id: Option<AccountId>,
    /// Blob created by the operation, when it created one.
    pub blob_id: Option<u64>,
}

impl Serializable for TransactionReceipt {
    fn serialize(&self, writer: &mut BinaryWriter) {
        writer.write_i32(self.status.code());
        match self.account_id {
            Some(id) => {
                writer.write_bool(true);
                id.serialize(writer);
            }
            None => writer.write_bool(false),
        }
        match self.blob_id {
            Some(id) => {
                writer.write_bool(true);
                writer.write_u64(id);
            }
            None => writer.write_bool(false),
        }
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            status: Status::from_code(reader.read_i32()?),
            account_id: match reader.read_bool()? {
                true => Some(AccountId::deserialize(reader)?),
                false => None,
            },
            blob_id: match reader.read_bool()? {
                true => Some(reader.read_u64()?),
                false => None,
            },
        })
    }
}

/// The full record of a submitted transaction, including its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub receipt: TransactionReceipt,
    pub consensus_timestamp: Timestamp,
    pub transaction_hash: Vec<u8>,
    pub memo: String,
}

impl Serializable for TransactionRecord {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.receipt.serialize(writer);
        self.consensus_timestamp.serialize(writer);
        writer.write_var_bytes(&self.transaction_hash);
        writer.write_var_string(&self.memo);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            receipt: TransactionReceipt::deserialize(reader)?,
            consensus_timestamp: Timestamp::deserialize(reader)?,
            transaction_hash: reader.read_var_bytes(MAX_BODY_BYTES)?.to_vec(),
            memo: reader.read_var_string(MAX_MEMO_BYTES)?,
        })
    }
}

/// Response body of a balance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: u64,
}

impl Serializable for AccountBalance {
    fn serialize(&self, writer: &mut BinaryWriter) {
        self.account_id.serialize(writer);
        writer.write_u64(self.balance);
    }

    fn deserialize(reader: &mut MemoryReader) -> IoResult<Self> {
        Ok(Self {
            account_id: AccountId::deserialize(reader)?,
            balance: reader.read_u64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_crypto::PrivateKey;

    fn sample_body() -> TransactionBody {
        TransactionBody {
            transaction_id: TransactionId::new(AccountId::new(2), Timestamp::new(100, 5)),
            node_account_id: AccountId::new(3),
            valid_duration_seconds: 120,
            max_fee: 100_000,
            memo: "hello".to_string(),
            chunk_info: None,
            payload: TransactionPayload::Transfer {
                sender: AccountId::new(2),
                recipient: AccountId::new(9),
                amount: 10,
            },
        }
    }

    #[test]
    fn test_transaction_body_roundtrip() {
        let body = sample_body();
        assert_eq!(TransactionBody::from_array(&body.to_array()).unwrap(), body);
    }

    #[test]
    fn test_body_with_chunk_info_roundtrip() {
        let mut body = sample_body();
        body.chunk_info = Some(ChunkInfo {
            initial_transaction_id: body.transaction_id,
            index: 2,
            total: 5,
        });
        body.payload = TransactionPayload::BlobAppend {
            contents: vec![1, 2, 3],
        };

        assert_eq!(TransactionBody::from_array(&body.to_array()).unwrap(), body);
    }

    #[test]
    fn test_signature_map_replaces_on_same_key() {
        let key = PrivateKey::generate();
        let mut map = SignatureMap::new();

        map.insert(key.public_key(), key.sign(b"one"));
        map.insert(key.public_key(), key.sign(b"two"));

        assert_eq!(map.len(), 1);
        key.public_key()
            .verify(b"two", map.get(&key.public_key()).unwrap())
            .unwrap();
    }

    #[test]
    fn test_signature_map_serialization_is_key_ordered() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();

        let mut forward = SignatureMap::new();
        forward.insert(a.public_key(), a.sign(b"msg"));
        forward.insert(b.public_key(), b.sign(b"msg"));

        let mut reverse = SignatureMap::new();
        reverse.insert(b.public_key(), b.sign(b"msg"));
        reverse.insert(a.public_key(), a.sign(b"msg"));

        assert_eq!(forward.to_array(), reverse.to_array());
    }

    #[test]
    fn test_signed_transaction_roundtrip() {
        let key = PrivateKey::generate();
        let mut signed = SignedTransaction::new(sample_body().to_array());
        signed
            .signatures
            .insert(key.public_key(), key.sign(&signed.body_bytes));

        let decoded = SignedTransaction::from_array(&signed.to_array()).unwrap();
        assert_eq!(decoded, signed);
        decoded.body().unwrap();
    }

    #[test]
    fn test_request_envelope_roundtrip() {
        let request = RequestEnvelope::Query(QueryPayload::Receipt {
            transaction_id: TransactionId::new(AccountId::new(2), Timestamp::new(55, 0)),
        });
        assert_eq!(
            RequestEnvelope::from_array(&request.to_array()).unwrap(),
            request
        );
    }

    #[test]
    fn test_response_envelope_roundtrip() {
        let receipt = TransactionReceipt {
            status: Status::Ok,
            account_id: None,
            blob_id: Some(17),
        };
        let envelope = ResponseEnvelope::with_body(Status::Ok, &receipt);

        let decoded = ResponseEnvelope::from_array(&envelope.to_array()).unwrap();
        assert_eq!(decoded.status, Status::Ok);
        assert_eq!(
            TransactionReceipt::from_array(&decoded.body).unwrap(),
            receipt
        );
    }

    #[test]
    fn test_unknown_tags_are_io_errors() {
        assert!(RequestEnvelope::from_array(&[9]).is_err());
        assert!(TransactionPayload::from_array(&[9]).is_err());
        assert!(QueryPayload::from_array(&[9]).is_err());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = TransactionRecord {
            receipt: TransactionReceipt {
                status: Status::Ok,
                account_id: Some(AccountId::new(88)),
                blob_id: None,
            },
            consensus_timestamp: Timestamp::new(500, 1),
            transaction_hash: vec![0xAA; 48],
            memo: "chunk 1".to_string(),
        };
        assert_eq!(
            TransactionRecord::from_array(&record.to_array()).unwrap(),
            record
        );
    }
}
