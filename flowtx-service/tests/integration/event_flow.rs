use super::harness::*;
use flowtx_core::foundation::TransactionId;
use flowtx_core::infrastructure::chain::MockSubmitter;

#[tokio::test]
async fn test_event_when_sink_accepts_then_forwarded_and_acked() {
    let mut harness = ServiceHarness::new(test_config(2, false), MockSubmitter::succeeding());
    harness.start();
    harness.send_raw(EVENT_TOPIC, event_json("ev-1", "tx1").to_string().as_bytes()).await;

    assert!(wait_until(WAIT, || harness.transport.acked(EVENT_TOPIC).len() == 1).await, "event never acked");
    let accepted = harness.sink.accepted();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id, "ev-1");
    assert_eq!(accepted[0].block_height, 48_213_007);
    harness.stop().await;
}

#[tokio::test]
async fn test_event_when_sink_rejects_then_not_acked() {
    let mut harness = ServiceHarness::new(test_config(2, false), MockSubmitter::succeeding());
    harness.sink.set_rejecting(true);
    harness.start();
    harness.send_raw(EVENT_TOPIC, event_json("ev-1", "tx1").to_string().as_bytes()).await;

    assert!(wait_until(WAIT, || harness.flow.metrics().snapshot().events_rejected == 1).await);
    assert!(harness.transport.acked(EVENT_TOPIC).is_empty());

    harness.sink.set_rejecting(false);
    assert_eq!(harness.transport.redeliver_unacked(EVENT_TOPIC), 1);
    assert!(wait_until(WAIT, || harness.transport.acked(EVENT_TOPIC).len() == 1).await, "redelivered event never acked");
    harness.stop().await;
}

#[tokio::test]
async fn test_event_when_payload_malformed_then_not_acked() {
    let mut harness = ServiceHarness::new(test_config(2, false), MockSubmitter::succeeding());
    harness.start();
    harness.send_raw(EVENT_TOPIC, b"{\"id\": \"ev-1\"}").await;

    assert!(wait_until(WAIT, || harness.flow.metrics().snapshot().messages_malformed == 1).await);
    assert!(harness.transport.acked(EVENT_TOPIC).is_empty());
    assert!(harness.sink.accepted().is_empty());
    harness.stop().await;
}

#[tokio::test]
async fn test_event_when_release_enabled_then_transaction_lease_freed() {
    let mut harness = ServiceHarness::new(test_config(1, true), MockSubmitter::succeeding());
    harness.start();
    harness.send_command("c1").await;
    assert!(wait_until(WAIT, || harness.transport.acked(COMMAND_TOPIC).len() == 1).await);
    assert_eq!(harness.store.live_lease_count(), 1);

    harness.send_raw(EVENT_TOPIC, event_json("ev-1", "tx1").to_string().as_bytes()).await;
    assert!(wait_until(WAIT, || harness.transport.acked(EVENT_TOPIC).len() == 1).await);
    assert!(wait_until(WAIT, || harness.store.live_lease_count() == 0).await, "lease not released by event");
    harness.stop().await;
}

#[tokio::test]
async fn test_event_when_release_disabled_then_lease_kept() {
    let mut harness = ServiceHarness::new(test_config(1, false), MockSubmitter::succeeding());
    harness.start();
    harness.send_command("c1").await;
    assert!(wait_until(WAIT, || harness.transport.acked(COMMAND_TOPIC).len() == 1).await);

    harness.send_raw(EVENT_TOPIC, event_json("ev-1", "tx1").to_string().as_bytes()).await;
    assert!(wait_until(WAIT, || harness.transport.acked(EVENT_TOPIC).len() == 1).await);
    assert_eq!(harness.store.live_lease_count(), 1);
    assert_eq!(
        harness.flow.leases().release_by_transaction(&TransactionId::from("tx1")).await.unwrap().map(|index| index.get()),
        Some(1)
    );
    harness.stop().await;
}

#[tokio::test]
async fn test_event_when_transaction_unknown_then_still_acked() {
    let mut harness = ServiceHarness::new(test_config(1, true), MockSubmitter::succeeding());
    harness.start();
    harness.send_raw(EVENT_TOPIC, event_json("ev-1", "not-ours").to_string().as_bytes()).await;

    assert!(wait_until(WAIT, || harness.transport.acked(EVENT_TOPIC).len() == 1).await);
    assert_eq!(harness.sink.accepted().len(), 1);
    harness.stop().await;
}
