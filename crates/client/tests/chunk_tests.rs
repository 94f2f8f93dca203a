//! Chunked upload: split math, ordering, identifier derivation, receipt
//! gating between chunks.

mod common;

use common::*;
use meridian_client::protocol::{QueryPayload, RequestEnvelope, TransactionPayload};
use meridian_client::BlobUploadTransaction;
use meridian_core::{AccountId, Error, Status, Timestamp, TransactionId};

fn base_id() -> TransactionId {
    TransactionId::new(AccountId::new(2), Timestamp::new(5_000, 0))
}

/// Scripts one accepted submission + one successful receipt per chunk.
fn script_chunks(transport: &ScriptedTransport, address: &str, chunks: usize) {
    for _ in 0..chunks {
        transport.push(address, reply_accepted());
        transport.push(address, reply_receipt(Status::Ok));
    }
}

#[tokio::test(start_paused = true)]
async fn nine_thousand_bytes_upload_as_three_ordered_chunks() {
    let transport = ScriptedTransport::new();
    script_chunks(&transport, &address_of(3), 3);

    let client = test_client(transport.clone(), 1);
    let contents: Vec<u8> = (0..9000u32).map(|i| (i % 251) as u8).collect();

    let mut upload = BlobUploadTransaction::new();
    upload
        .set_contents(contents.clone())
        .set_transaction_id(base_id());

    let responses = upload.execute_all(&client).await.unwrap();
    assert_eq!(responses.len(), 3);

    // Pull the submitted chunk bodies back out of the transport log.
    let mut chunk_payloads = Vec::new();
    let mut submits_seen = 0;
    let mut receipts_seen = 0;

    for call in transport.calls() {
        match call.request {
            RequestEnvelope::Transaction(signed) => {
                // Strict sequencing: every submission is gated on the
                // previous chunk's receipt.
                assert_eq!(submits_seen, receipts_seen);
                submits_seen += 1;

                let body = signed.body().unwrap();
                let info = body.chunk_info.expect("chunk info present");
                assert_eq!(info.initial_transaction_id, base_id());
                assert_eq!(info.total, 3);
                assert_eq!(info.index, submits_seen - 1);
                assert_eq!(
                    body.transaction_id,
                    TransactionId::chunk_derived(base_id(), info.index as usize)
                );

                chunk_payloads.push(body.payload);
            }
            RequestEnvelope::Query(QueryPayload::Receipt { transaction_id }) => {
                receipts_seen += 1;
                assert_eq!(
                    transaction_id,
                    TransactionId::chunk_derived(base_id(), receipts_seen as usize - 1)
                );
            }
            other => panic!("unexpected request {other:?}"),
        }
    }
    assert_eq!(submits_seen, 3);
    assert_eq!(receipts_seen, 3);

    // Chunk 0 creates, the rest append; sizes are 4096/4096/808; the
    // concatenation reproduces the original contents.
    let mut rejoined = Vec::new();
    for (index, payload) in chunk_payloads.into_iter().enumerate() {
        match payload {
            TransactionPayload::BlobCreate { contents } => {
                assert_eq!(index, 0);
                assert_eq!(contents.len(), 4096);
                rejoined.extend(contents);
            }
            TransactionPayload::BlobAppend { contents } => {
                assert!(index > 0);
                assert_eq!(contents.len(), if index == 1 { 4096 } else { 808 });
                rejoined.extend(contents);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
    assert_eq!(rejoined, contents);
}

#[tokio::test(start_paused = true)]
async fn chunk_budget_overflow_is_rejected_before_any_submission() {
    let transport = ScriptedTransport::new();
    let client = test_client(transport.clone(), 1);

    let mut upload = BlobUploadTransaction::new();
    upload.set_contents(vec![0u8; 9000]);
    upload.set_chunk_size(100).unwrap();

    let error = upload.execute_all(&client).await.unwrap_err();
    assert!(matches!(error, Error::Validation(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_chunk_receipt_aborts_the_remainder() {
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), reply_accepted());
    transport.push(&address_of(3), reply_receipt(Status::InvalidChunkInfo));

    let client = test_client(transport.clone(), 1);
    let mut upload = BlobUploadTransaction::new();
    upload
        .set_contents(vec![1u8; 9000])
        .set_transaction_id(base_id());

    let error = upload.execute_all(&client).await.unwrap_err();
    assert!(matches!(
        error,
        Error::ReceiptStatus {
            status: Status::InvalidChunkInfo,
            ..
        }
    ));

    // One submission and its receipt poll; chunk 1 never went out.
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_contents_upload_as_a_single_create() {
    let transport = ScriptedTransport::new();
    script_chunks(&transport, &address_of(3), 1);

    let client = test_client(transport.clone(), 1);
    let mut upload = BlobUploadTransaction::new();
    upload.set_transaction_id(base_id());

    let response = upload.execute(&client).await.unwrap();
    assert_eq!(response.transaction_id, base_id());

    let calls = transport.calls();
    match &calls[0].request {
        RequestEnvelope::Transaction(signed) => {
            let body = signed.body().unwrap();
            assert!(matches!(
                body.payload,
                TransactionPayload::BlobCreate { ref contents } if contents.is_empty()
            ));
        }
        other => panic!("unexpected request {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn execute_returns_the_last_chunk_outcome() {
    let transport = ScriptedTransport::new();
    script_chunks(&transport, &address_of(3), 2);

    let client = test_client(transport.clone(), 1);
    let mut upload = BlobUploadTransaction::new();
    upload
        .set_contents(vec![9u8; 5000])
        .set_transaction_id(base_id());

    let response = upload.execute(&client).await.unwrap();
    assert_eq!(
        response.transaction_id,
        TransactionId::chunk_derived(base_id(), 1)
    );
}
