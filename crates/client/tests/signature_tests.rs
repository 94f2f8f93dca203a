//! The offline multi-party signing flow, end to end.

mod common;

use common::*;
use meridian_client::protocol::RequestEnvelope;
use meridian_client::{FrozenTransaction, Transaction};
use meridian_core::{AccountId, Timestamp, TransactionId};
use meridian_crypto::PrivateKey;

fn pinned_transaction() -> Transaction {
    let mut transaction = Transaction::transfer(AccountId::new(2), AccountId::new(9), 250);
    transaction
        .set_transaction_id(TransactionId::new(
            AccountId::new(2),
            Timestamp::new(7_000, 0),
        ))
        .unwrap()
        .set_node_account_ids(vec![AccountId::new(3)])
        .unwrap();
    transaction
}

#[tokio::test(start_paused = true)]
async fn two_party_offline_signing_then_submission() {
    let party_a = PrivateKey::generate();
    let party_b = PrivateKey::generate();

    // Party A: build, freeze, sign, serialize. No client involved.
    let mut frozen = pinned_transaction().freeze().unwrap();
    frozen.sign(&party_a);
    let handoff = frozen.to_bytes();

    // Party B: deserialize, add the second signature, serialize again.
    let mut restored = FrozenTransaction::from_bytes(&handoff).unwrap();
    restored.sign(&party_b);
    let final_bytes = restored.to_bytes();

    // A further round-trip without modification is byte-identical.
    assert_eq!(
        FrozenTransaction::from_bytes(&final_bytes)
            .unwrap()
            .to_bytes(),
        final_bytes
    );

    // A submitter who only has the bytes executes them.
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), reply_accepted());
    let client = test_client(transport.clone(), 1);

    let submittable = FrozenTransaction::from_bytes(&final_bytes).unwrap();
    let response = submittable.execute(&client).await.unwrap();
    assert_eq!(response.node_account_id, AccountId::new(3));

    // The node received both signatures, each verifying over the body.
    let calls = transport.calls();
    let RequestEnvelope::Transaction(signed) = &calls[0].request else {
        panic!("expected a transaction submission");
    };
    assert_eq!(signed.signatures.len(), 2);
    for (public_key, signature) in signed.signatures.iter() {
        public_key.verify(&signed.body_bytes, signature).unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn add_signature_flow_matches_local_signing() {
    let party_a = PrivateKey::generate();
    let party_b = PrivateKey::generate();

    // Variant where party B signs the raw body bytes externally and only
    // the detached signature travels back.
    let mut local = pinned_transaction().freeze().unwrap();
    local.sign(&party_a);
    local.sign(&party_b);

    let mut detached = pinned_transaction().freeze().unwrap();
    detached.sign(&party_a);

    let body_bytes = {
        use meridian_client::Execute;
        use meridian_core::io::SerializableExt;

        let request = detached.make_request(AccountId::new(3)).unwrap();
        match RequestEnvelope::from_array(&request).unwrap() {
            RequestEnvelope::Transaction(signed) => signed.body_bytes,
            other => panic!("expected a transaction envelope, got {other:?}"),
        }
    };
    detached
        .add_signature(party_b.public_key(), party_b.sign(&body_bytes))
        .unwrap();

    assert_eq!(detached.to_bytes(), local.to_bytes());
}
