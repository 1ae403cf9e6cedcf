use crate::fixtures::*;
use flowtx_core::application::ObservedDispatch;
use flowtx_core::domain::{DispatchStage, LeaseState};
use flowtx_core::foundation::{ErrorCode, FlowTxError, KeyIndex, TransactionId};
use flowtx_core::infrastructure::chain::{MockSubmitter, SubmitBehavior};
use std::time::Duration;

#[tokio::test]
async fn test_dispatch_when_submission_accepted_then_lease_confirmed_for_transaction() {
    let harness = dispatch_harness(3, MockSubmitter::succeeding());
    let receipt = harness.dispatcher.dispatch(&command("c1")).await.expect("dispatch");

    assert_eq!(receipt.transaction_id, TransactionId::from("tx1"));
    assert_eq!(receipt.key_index, KeyIndex::new(1));
    let lease = harness.leases.snapshot().await.unwrap()[0].1.clone().expect("lease");
    assert_eq!(lease.state, LeaseState::Confirmed);
    assert_eq!(lease.holder, Some(TransactionId::from("tx1")));

    assert_eq!(
        harness.observer.stages_for(&receipt.command_id),
        vec![DispatchStage::Start, DispatchStage::KeyAcquired, DispatchStage::Submitted, DispatchStage::Confirmed]
    );
    assert!(harness.observer.events().contains(&ObservedDispatch::Confirmed(receipt)));
}

#[tokio::test]
async fn test_dispatch_when_building_request_then_admin_pays_and_leased_key_proposes() {
    let harness = dispatch_harness(3, MockSubmitter::succeeding());
    harness.dispatcher.dispatch(&command("c1")).await.unwrap();

    let requests = harness.submitter.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.payer.key_index, KeyIndex::new(0));
    assert_eq!(request.signers, vec![request.payer.clone()]);
    assert_eq!(request.proposer.key_index, KeyIndex::new(1));
    assert_eq!(request.proposer.address, ADMIN_ADDRESS);
    assert_eq!(request.proposer.kms_resource, KMS_RESOURCE);
    assert_eq!(request.compute_limit, 9999);
    assert_eq!(request.arguments, command("c1").payload);
    assert_eq!(request.address_map.get("FUSD").map(String::as_str), Some(FUSD_ADDRESS));
    assert!(request.code.contains("FUSD.Vault"));
}

#[tokio::test]
async fn test_dispatch_when_kind_unknown_then_no_lease_is_taken() {
    let harness = dispatch_harness(1, MockSubmitter::succeeding());
    let err = harness.dispatcher.dispatch(&command_of_kind("c1", "NFT_MINT")).await.unwrap_err();

    assert!(matches!(err, FlowTxError::UnknownTransactionKind(ref kind) if kind == "NFT_MINT"));
    assert!(!err.is_retryable());
    assert_eq!(harness.store.live_lease_count(), 0);
    assert_eq!(harness.submitter.submission_count(), 0);
    assert_eq!(harness.observer.stages_for(&"c1".into()), vec![DispatchStage::Start, DispatchStage::Failed]);
}

#[tokio::test]
async fn test_dispatch_when_pool_exhausted_then_no_key_available() {
    let harness = dispatch_harness(1, MockSubmitter::succeeding());
    harness.dispatcher.dispatch(&command("c1")).await.unwrap();

    let err = harness.dispatcher.dispatch(&command("c2")).await.unwrap_err();
    assert!(matches!(err, FlowTxError::PoolExhausted { pool_size: 1 }));
    assert_eq!(harness.submitter.submission_count(), 1);
    assert_eq!(harness.observer.stages_for(&"c2".into()), vec![DispatchStage::Start, DispatchStage::NoKeyAvailable]);
    assert!(harness.observer.events().contains(&ObservedDispatch::Failed {
        command_id: "c2".into(),
        stage: DispatchStage::NoKeyAvailable,
        code: ErrorCode::PoolExhausted,
    }));
}

#[tokio::test]
async fn test_dispatch_when_submission_fails_then_lease_released_once() {
    let harness = dispatch_harness(1, MockSubmitter::succeeding());
    harness.submitter.push_behavior(SubmitBehavior::Fail("sequence number mismatch".to_string()));

    let err = harness.dispatcher.dispatch(&command("c1")).await.unwrap_err();
    assert!(matches!(err, FlowTxError::SubmissionFailed { key_index: 1, .. }));
    assert_eq!(harness.store.live_lease_count(), 0);
    assert_eq!(harness.counting.releases(), vec![KeyIndex::new(1)]);
    assert_eq!(harness.counting.release_by_holder_calls(), 0);
    assert_eq!(harness.observer.stages_for(&"c1".into()), vec![DispatchStage::Start, DispatchStage::KeyAcquired, DispatchStage::Failed]);

    let receipt = harness.dispatcher.dispatch(&command("c1")).await.expect("redelivered dispatch");
    assert_eq!(receipt.key_index, KeyIndex::new(1));
    assert_eq!(harness.counting.releases().len(), 1, "successful dispatch must not release");
}

#[tokio::test]
async fn test_dispatch_when_submission_hangs_then_timeout_releases_key() {
    let harness = dispatch_harness_with_timeout(1, MockSubmitter::hanging(), Duration::from_millis(50));

    let err = harness.dispatcher.dispatch(&command("c1")).await.unwrap_err();
    assert!(matches!(err, FlowTxError::SubmissionFailed { key_index: 1, .. }));
    assert_eq!(harness.store.live_lease_count(), 0);
    assert_eq!(harness.counting.releases(), vec![KeyIndex::new(1)]);
}

#[tokio::test]
async fn test_dispatch_when_store_unavailable_then_failure_surfaces() {
    let harness = dispatch_harness(2, MockSubmitter::succeeding());
    harness.store.set_unavailable(true);

    let err = harness.dispatcher.dispatch(&command("c1")).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    assert_eq!(harness.submitter.submission_count(), 0);
}

#[tokio::test]
async fn test_dispatch_when_many_commands_race_then_each_gets_distinct_key() {
    let harness = std::sync::Arc::new(dispatch_harness(4, MockSubmitter::succeeding()));
    let mut handles = Vec::new();
    for n in 0..4 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move { harness.dispatcher.dispatch(&command(&format!("c{n}"))).await }));
    }
    let mut keys = Vec::new();
    for handle in handles {
        keys.push(handle.await.unwrap().unwrap().key_index.get());
    }
    keys.sort_unstable();
    assert_eq!(keys, vec![1, 2, 3, 4]);
    assert_eq!(harness.observer.reached(DispatchStage::Submitted), 4);
}
