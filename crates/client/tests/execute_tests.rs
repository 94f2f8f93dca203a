//! Engine behavior: retry, failover, classification, exhaustion, timeout.

mod common;

use std::time::Duration;

use common::*;
use meridian_client::{AccountBalanceQuery, Transaction};
use meridian_core::{AccountId, Error, Status};

#[tokio::test(start_paused = true)]
async fn busy_twice_then_success_takes_exactly_three_attempts() {
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), reply_status(Status::Busy));
    transport.push(&address_of(3), reply_status(Status::Busy));
    transport.push(&address_of(3), reply_accepted());

    let client = test_client(transport.clone(), 1);
    let response = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(response.node_account_id, AccountId::new(3));
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn retry_backoff_doubles_between_attempts() {
    let transport = ScriptedTransport::new();
    for _ in 0..3 {
        transport.push(&address_of(3), reply_status(Status::Busy));
    }
    transport.push(&address_of(3), reply_accepted());

    let client = test_client(transport.clone(), 1);
    Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 4);

    // With the paused clock, gaps are exactly the engine's backoff:
    // 250ms, then 500ms, then 1s.
    let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1].at - w[0].at).collect();
    assert_eq!(gaps[0], Duration::from_millis(250));
    assert_eq!(gaps[1], Duration::from_millis(500));
    assert_eq!(gaps[2], Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn transport_failure_fails_over_to_another_node() {
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), Reply::Fault("connection refused".into()));
    transport.push(&address_of(4), reply_accepted());

    let client = test_client(transport.clone(), 2);
    let response = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await
        .unwrap();

    assert_eq!(response.node_account_id, AccountId::new(4));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].address, address_of(3));
    assert_eq!(calls[1].address, address_of(4));

    // The failed node entered backoff; the answering node did not.
    let node3 = client.network().node(&AccountId::new(3)).unwrap();
    assert!(node3.backoff_until() > 0);
    let node4 = client.network().node(&AccountId::new(4)).unwrap();
    assert_eq!(node4.use_count(), 1);
    assert_eq!(node4.backoff_until(), 0);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_status_surfaces_with_context() {
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), reply_status(Status::InsufficientBalance));

    let client = test_client(transport.clone(), 1);
    let error = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await
        .unwrap_err();

    match error {
        Error::Status {
            status,
            node_account_id,
            transaction_id,
        } => {
            assert_eq!(status, Status::InsufficientBalance);
            assert_eq!(node_account_id, AccountId::new(3));
            assert!(transaction_id.is_some());
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unrecognized_status_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), reply_status(Status::Unrecognized(99)));

    let client = test_client(transport.clone(), 1);
    let error = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Status {
            status: Status::Unrecognized(99),
            ..
        }
    ));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn attempts_never_exceed_max_attempts() {
    let transport = ScriptedTransport::new();
    for _ in 0..10 {
        transport.push(&address_of(3), reply_status(Status::Busy));
    }

    let client = test_client(transport.clone(), 1);
    client.set_max_attempts(3);

    let error = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await
        .unwrap_err();

    assert_eq!(transport.call_count(), 3);
    match error {
        Error::Timeout { message } => {
            // The exhaustion error embeds the last observed failure.
            assert!(message.contains("Busy"), "{message}");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn overall_timeout_beats_remaining_attempts() {
    let transport = ScriptedTransport::new();
    for _ in 0..10 {
        transport.push(&address_of(3), reply_status(Status::Busy));
    }

    let client = test_client(transport.clone(), 1);
    // Make the first retry delay larger than the whole budget.
    client.set_min_backoff(Duration::from_secs(10));

    let mut transaction = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10);
    let frozen = transaction.freeze_with(Some(&client)).unwrap();

    let error = frozen
        .execute_with_timeout(&client, Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Timeout { .. }));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn validation_error_never_reaches_the_network() {
    let transport = ScriptedTransport::new();
    let client = test_client(transport.clone(), 1);

    // Balance query without an account id is malformed.
    let error = AccountBalanceQuery::new().execute(&client).await.unwrap_err();

    assert!(matches!(error, Error::Validation(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn balance_query_round_trip() {
    use meridian_client::protocol::{AccountBalance, ResponseEnvelope};
    use meridian_core::io::SerializableExt;

    let transport = ScriptedTransport::new();
    let balance = AccountBalance {
        account_id: AccountId::new(7),
        balance: 123_456,
    };
    transport.push(
        &address_of(3),
        Reply::Respond(ResponseEnvelope::with_body(Status::Ok, &balance).to_array()),
    );

    let client = test_client(transport.clone(), 1);
    let mut query = AccountBalanceQuery::new();
    query.set_account_id(AccountId::new(7));

    assert_eq!(query.execute(&client).await.unwrap(), balance);
}

#[tokio::test(start_paused = true)]
async fn health_is_recorded_even_when_the_request_fails() {
    let transport = ScriptedTransport::new();
    transport.push(&address_of(3), reply_status(Status::InvalidSignature));

    let client = test_client(transport.clone(), 1);
    let _ = Transaction::transfer(AccountId::new(2), AccountId::new(9), 10)
        .execute(&client)
        .await;

    // The node answered, so its health improved despite the rejection.
    let node = client.network().node(&AccountId::new(3)).unwrap();
    assert_eq!(node.use_count(), 1);
    assert!(node.is_healthy(0));
}
