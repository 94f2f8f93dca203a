//! Scripted in-process transport for driving the execution engine in tests.

// Each test binary compiles this module separately and uses a different
// subset of the helpers.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use meridian_client::protocol::{
    RequestEnvelope, ResponseEnvelope, TransactionReceipt, TransactionRecord,
};
use meridian_client::{Client, NodeAddressEntry, Transport, TransportFault};
use meridian_core::io::SerializableExt;
use meridian_core::{AccountId, Status, Timestamp};
use meridian_crypto::PrivateKey;

/// One pre-scripted node reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Transport-level failure (connection refused, deadline, ...).
    Fault(String),
    /// A response envelope, returned as wire bytes.
    Respond(Vec<u8>),
}

/// One observed transport call.
#[derive(Debug, Clone)]
pub struct Call {
    pub address: String,
    pub request: RequestEnvelope,
    pub at: Instant,
}

/// Transport whose replies are pre-loaded per node address, FIFO.
///
/// An exhausted queue answers with a transport fault, which keeps broken
/// test scripts from hanging the retry loop forever.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    log: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, address: &str, reply: Reply) {
        self.scripts
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(
        &self,
        address: &str,
        request: &[u8],
        _deadline: Option<std::time::Duration>,
    ) -> Result<Vec<u8>, TransportFault> {
        let request = RequestEnvelope::from_array(request)
            .map_err(|e| TransportFault::new(format!("malformed request bytes: {e}")))?;

        self.log.lock().unwrap().push(Call {
            address: address.to_string(),
            request,
            at: Instant::now(),
        });

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(address)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Respond(bytes)) => Ok(bytes),
            Some(Reply::Fault(message)) => Err(TransportFault::new(message)),
            None => Err(TransportFault::new(format!(
                "no scripted reply for {address}"
            ))),
        }
    }
}

/// Address used for the node owned by account `0.num` in tests.
pub fn address_of(num: u64) -> String {
    format!("10.0.0.{num}:50211")
}

/// A client over `transport` with nodes `0.3 .. 0.(3 + node_count - 1)`
/// and an operator on account `0.2`.
pub fn test_client(transport: Arc<ScriptedTransport>, node_count: u64) -> Client {
    let entries: Vec<NodeAddressEntry> = (3..3 + node_count)
        .map(|num| NodeAddressEntry::new(AccountId::new(num), address_of(num)))
        .collect();

    let client = Client::for_network_with_transport(entries, transport).unwrap();
    client.set_operator(AccountId::new(2), PrivateKey::generate());
    client
}

/// An `Ok` answer to a transaction submission.
pub fn reply_accepted() -> Reply {
    Reply::Respond(ResponseEnvelope::status_only(Status::Ok).to_array())
}

/// A bare status answer (no body).
pub fn reply_status(status: Status) -> Reply {
    Reply::Respond(ResponseEnvelope::status_only(status).to_array())
}

/// An `Ok`-precheck answer carrying a receipt with `receipt_status`.
pub fn reply_receipt(receipt_status: Status) -> Reply {
    let receipt = TransactionReceipt {
        status: receipt_status,
        account_id: None,
        blob_id: None,
    };
    Reply::Respond(ResponseEnvelope::with_body(Status::Ok, &receipt).to_array())
}

/// An `Ok`-precheck answer carrying a record whose receipt has
/// `receipt_status`.
pub fn reply_record(receipt_status: Status) -> Reply {
    let record = TransactionRecord {
        receipt: TransactionReceipt {
            status: receipt_status,
            account_id: None,
            blob_id: None,
        },
        consensus_timestamp: Timestamp::new(1_000, 0),
        transaction_hash: vec![0xAB; 48],
        memo: String::new(),
    };
    Reply::Respond(ResponseEnvelope::with_body(Status::Ok, &record).to_array())
}
