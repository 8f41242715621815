use std::time::Duration;

use super::*;
use crate::test_support::{area, loaded, ScriptedAreaQuery};
use shared::protocol::AreaListResponse;

fn controller_for(
    query: Arc<ScriptedAreaQuery>,
) -> (
    AreaSyncController,
    mpsc::UnboundedReceiver<SyncOutcome>,
    CancellationToken,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let lifetime = CancellationToken::new();
    (
        AreaSyncController::new(query, tx, lifetime.clone()),
        rx,
        lifetime,
    )
}

#[tokio::test]
async fn unresolved_lot_is_a_silent_no_op() {
    let query = ScriptedAreaQuery::answering(loaded(Vec::new()));
    let (mut controller, mut rx, _lifetime) = controller_for(query.clone());

    assert!(!controller.sync(LotId::UNRESOLVED));
    assert!(!controller.is_in_flight());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(query.calls(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn transport_failures_are_retried_until_the_service_answers() {
    let records = vec![area(1, "Level A", 4), area(2, "Level B", 4)];
    let query = ScriptedAreaQuery::failing_then(5, loaded(records.clone()));
    let (mut controller, mut rx, _lifetime) = controller_for(query.clone());

    assert!(controller.sync(LotId(4)));
    let outcome = rx.recv().await.expect("outcome");

    assert_eq!(
        outcome,
        SyncOutcome::Loaded {
            lot_id: LotId(4),
            records
        }
    );
    assert_eq!(query.calls(), 6);
    assert!(query.requested().await.iter().all(|lot| *lot == LotId(4)));
}

#[tokio::test]
async fn rejected_listing_is_reported_once_and_not_retried() {
    let query = ScriptedAreaQuery::answering(AreaListResponse {
        success: false,
        result: vec![area(1, "ignored", 4)],
    });
    let (mut controller, mut rx, _lifetime) = controller_for(query.clone());

    controller.sync(LotId(4));
    let outcome = rx.recv().await.expect("outcome");
    assert_eq!(outcome, SyncOutcome::Rejected { lot_id: LotId(4) });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(query.calls(), 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn second_sync_is_ignored_while_one_is_outstanding() {
    let query = ScriptedAreaQuery::always_failing();
    let (mut controller, _rx, _lifetime) = controller_for(query.clone());

    assert!(controller.sync(LotId(4)));
    assert!(!controller.sync(LotId(4)));
    assert!(controller.is_in_flight());

    controller.cancel();
}

#[tokio::test]
async fn populated_controller_does_not_fetch_again() {
    let query = ScriptedAreaQuery::answering(loaded(vec![area(1, "A", 4)]));
    let (mut controller, mut rx, _lifetime) = controller_for(query.clone());

    controller.sync(LotId(4));
    let outcome = rx.recv().await.expect("outcome");
    controller.acknowledge(&outcome, true);

    assert!(controller.is_populated());
    assert!(!controller.sync(LotId(4)));
    assert_eq!(query.calls(), 1);
}

#[tokio::test]
async fn rejected_sync_can_be_started_again() {
    let query = ScriptedAreaQuery::answering(AreaListResponse {
        success: false,
        result: Vec::new(),
    });
    let (mut controller, mut rx, _lifetime) = controller_for(query.clone());

    controller.sync(LotId(4));
    let outcome = rx.recv().await.expect("outcome");
    controller.acknowledge(&outcome, false);

    assert!(!controller.is_populated());
    assert!(controller.sync(LotId(4)));
    rx.recv().await.expect("second outcome");
    assert_eq!(query.calls(), 2);
}

#[tokio::test]
async fn cancelling_the_lifetime_stops_the_retry_loop() {
    let query = ScriptedAreaQuery::always_failing();
    let (mut controller, mut rx, lifetime) = controller_for(query.clone());

    controller.sync(LotId(4));
    tokio::time::sleep(Duration::from_millis(20)).await;
    let before = query.calls();
    assert!(before > 1, "expected repeated fetches, saw {before}");

    lifetime.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // No attempt may start once the token fires, not even one already queued.
    assert_eq!(query.calls(), before);
    assert!(rx.try_recv().is_err());
    assert!(!controller.sync(LotId(4)));
}

#[tokio::test]
async fn dropping_the_controller_cancels_the_fetch() {
    let query = ScriptedAreaQuery::always_failing();
    let (mut controller, _rx, lifetime) = controller_for(query.clone());

    controller.sync(LotId(4));
    tokio::time::sleep(Duration::from_millis(5)).await;
    drop(controller);

    assert!(lifetime.is_cancelled());
    let after_drop = query.calls();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(query.calls(), after_drop);
}
