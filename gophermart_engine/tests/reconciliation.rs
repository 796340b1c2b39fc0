mod support;

use std::time::Duration;

use accrual_tools::{AccrualApiError, AccrualOutcome, AccrualStatus};
use gm_common::Points;
use gophermart_engine::{
    db_types::{OrderId, OrderStatusType, UserId},
    AccrualService,
    LedgerApi,
    LedgerApiError,
    LedgerStore,
    MemoryDatabase,
    OrderFlowApi,
    RateLimit,
    ReconciliationApi,
    ReconciliationError,
};
use mockall::{predicate::eq, Sequence};
use support::{init_logging, order_id, processed, sqlite_db, MockAccrual, ORDER_NUMBERS};
use tokio_util::sync::CancellationToken;

fn alice() -> UserId {
    UserId::from("alice")
}

async fn submit_all<B: LedgerStore>(db: &B, numbers: &[i64]) {
    let api = OrderFlowApi::new(db.clone());
    for n in numbers {
        api.submit_order(&alice(), &n.to_string()).await.expect("submit order");
    }
}

async fn statuses<B: LedgerStore>(db: &B) -> Vec<(i64, OrderStatusType)> {
    db.read_orders(&alice(), &[]).await.unwrap().into_iter().map(|o| (o.order_id.value(), o.status)).collect()
}

/// Submit, resolve, then spend: the whole life of one order's points.
async fn example_scenario<B: LedgerStore>(db: B) {
    let orders = OrderFlowApi::new(db.clone());
    orders.submit_order(&alice(), "12345678903").await.unwrap();

    let mut accrual = MockAccrual::new();
    accrual
        .expect_resolve()
        .with(eq(order_id(12345678903)))
        .times(1)
        .returning(|_| Ok(AccrualOutcome::Resolved { status: AccrualStatus::Processed, accrual: Points::from(50050) }));
    let reconciler = ReconciliationApi::new(db.clone(), accrual);
    let summary = reconciler.run_tick(10, &CancellationToken::new()).await;
    assert_eq!(summary.examined, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.accrued, Points::from(50050));
    assert!(!summary.is_error());

    assert_eq!(statuses(&db).await, vec![(12345678903, OrderStatusType::Processed)]);
    let accruals = db.read_ledger(&alice(), true).await.unwrap();
    assert_eq!(accruals.len(), 1);
    assert_eq!(accruals[0].points.value(), 50050);

    let ledger = LedgerApi::new(db.clone());
    assert_eq!(ledger.balance(&alice()).await.unwrap().current.value(), 50050);
    let err = ledger.withdraw(&alice(), "2377225624", Points::from(60000)).await.unwrap_err();
    assert_eq!(err, LedgerApiError::InsufficientBalance {
        current: Points::from(50050),
        requested: Points::from(60000)
    });
    ledger.withdraw(&alice(), "2377225624", Points::from(50000)).await.unwrap();
    let balance = ledger.balance(&alice()).await.unwrap();
    assert_eq!(balance.current.value(), 50);
    assert_eq!(balance.withdrawn.value(), 50000);

    let listed = orders.orders_for_user(&alice()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].accrual, Some(Points::from(50050)));

    // Processed orders are never polled again
    let mut idle = MockAccrual::new();
    idle.expect_resolve().never();
    let summary = ReconciliationApi::new(db, idle).run_tick(10, &CancellationToken::new()).await;
    assert_eq!(summary.examined, 0);
}

#[tokio::test]
async fn example_scenario_in_memory() {
    init_logging();
    example_scenario(MemoryDatabase::new()).await;
}

#[tokio::test]
async fn example_scenario_in_sqlite() {
    let (_dir, db) = sqlite_db().await;
    example_scenario(db).await;
}

#[tokio::test]
async fn rate_limit_halts_the_batch_without_error() {
    let (_dir, db) = sqlite_db().await;
    let numbers = &ORDER_NUMBERS[..5];
    submit_all(&db, numbers).await;

    let mut accrual = MockAccrual::new();
    let mut seq = Sequence::new();
    accrual.expect_resolve().with(eq(order_id(18))).times(1).in_sequence(&mut seq).returning(|_| processed(100));
    accrual.expect_resolve().with(eq(order_id(26))).times(1).in_sequence(&mut seq).returning(|_| processed(200));
    accrual
        .expect_resolve()
        .with(eq(order_id(34)))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(AccrualOutcome::RateLimited { retry_after: Some(Duration::from_secs(60)) }));
    let reconciler = ReconciliationApi::new(db.clone(), accrual);
    let summary = reconciler.run_tick(10, &CancellationToken::new()).await;

    assert!(!summary.is_error());
    assert_eq!(summary.rate_limited, Some(RateLimit { retry_after: Some(Duration::from_secs(60)) }));
    assert_eq!(summary.examined, 3);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.accrued, Points::from(300));
    assert_eq!(statuses(&db).await, vec![
        (18, OrderStatusType::Processed),
        (26, OrderStatusType::Processed),
        (34, OrderStatusType::New),
        (42, OrderStatusType::New),
        (59, OrderStatusType::New),
    ]);

    // The next tick picks up where this one stopped
    let mut accrual = MockAccrual::new();
    accrual.expect_resolve().times(3).returning(|_| processed(1));
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(10, &CancellationToken::new()).await;
    assert_eq!(summary.updated, 3);
    assert!(db.read_pending_orders(OrderStatusType::pending(), 0).await.unwrap().is_empty());
    assert_eq!(db.balance(&alice()).await.unwrap().unwrap().current, Points::from(303));
}

#[tokio::test]
async fn failure_halts_the_batch_and_is_reported() {
    init_logging();
    let db = MemoryDatabase::new();
    submit_all(&db, &ORDER_NUMBERS[..4]).await;

    let mut accrual = MockAccrual::new();
    accrual.expect_resolve().with(eq(order_id(18))).times(1).returning(|_| processed(100));
    accrual
        .expect_resolve()
        .with(eq(order_id(26)))
        .times(1)
        .returning(|_| Err(AccrualApiError::QueryError { status: 500, message: "boom".to_string() }));
    accrual.expect_resolve().with(eq(order_id(34))).never();
    accrual.expect_resolve().with(eq(order_id(42))).never();
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(10, &CancellationToken::new()).await;

    assert!(summary.is_error());
    assert!(matches!(summary.halted_by, Some(ReconciliationError::AccrualError(AccrualApiError::QueryError { .. }))));
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.rate_limited, None);
    assert_eq!(statuses(&db).await, vec![
        (18, OrderStatusType::Processed),
        (26, OrderStatusType::New),
        (34, OrderStatusType::New),
        (42, OrderStatusType::New),
    ]);
}

#[tokio::test]
async fn pending_orders_are_skipped() {
    init_logging();
    let db = MemoryDatabase::new();
    submit_all(&db, &ORDER_NUMBERS[..3]).await;

    let mut accrual = MockAccrual::new();
    accrual.expect_resolve().with(eq(order_id(18))).times(1).returning(|_| Ok(AccrualOutcome::Pending));
    accrual.expect_resolve().with(eq(order_id(26))).times(1).returning(|_| {
        Ok(AccrualOutcome::Resolved { status: AccrualStatus::Invalid, accrual: Points::default() })
    });
    accrual.expect_resolve().with(eq(order_id(34))).times(1).returning(|_| processed(0));
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(10, &CancellationToken::new()).await;

    assert!(!summary.is_error());
    assert_eq!(summary.examined, 3);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.accrued, Points::default());
    assert_eq!(statuses(&db).await, vec![
        (18, OrderStatusType::New),
        (26, OrderStatusType::Invalid),
        (34, OrderStatusType::Processed),
    ]);
    // A zero award is a status-only update
    assert_eq!(db.balance(&alice()).await.unwrap(), None);
}

#[tokio::test]
async fn intermediate_statuses_keep_orders_pending() {
    init_logging();
    let db = MemoryDatabase::new();
    submit_all(&db, &ORDER_NUMBERS[..2]).await;

    let mut accrual = MockAccrual::new();
    accrual.expect_resolve().with(eq(order_id(18))).times(1).returning(|_| {
        Ok(AccrualOutcome::Resolved { status: AccrualStatus::Registered, accrual: Points::default() })
    });
    accrual.expect_resolve().with(eq(order_id(26))).times(1).returning(|_| {
        Ok(AccrualOutcome::Resolved { status: AccrualStatus::Processing, accrual: Points::from(999) })
    });
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(10, &CancellationToken::new()).await;

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.accrued, Points::default());
    assert_eq!(statuses(&db).await, vec![(18, OrderStatusType::Registered), (26, OrderStatusType::Processing)]);
    assert_eq!(db.read_pending_orders(OrderStatusType::pending(), 0).await.unwrap().len(), 2);
    assert_eq!(db.balance(&alice()).await.unwrap(), None);

    // Hearing the same status again changes nothing
    let mut accrual = MockAccrual::new();
    accrual.expect_resolve().with(eq(order_id(18))).times(1).returning(|_| {
        Ok(AccrualOutcome::Resolved { status: AccrualStatus::Registered, accrual: Points::default() })
    });
    accrual.expect_resolve().with(eq(order_id(26))).times(1).returning(|_| Ok(AccrualOutcome::Pending));
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(10, &CancellationToken::new()).await;
    assert_eq!(summary.examined, 2);
    assert_eq!(summary.updated, 0);
}

#[tokio::test]
async fn batch_limit_is_respected() {
    init_logging();
    let db = MemoryDatabase::new();
    submit_all(&db, &ORDER_NUMBERS).await;

    let mut accrual = MockAccrual::new();
    let mut seq = Sequence::new();
    for n in &ORDER_NUMBERS[..3] {
        accrual.expect_resolve().with(eq(order_id(*n))).times(1).in_sequence(&mut seq).returning(|_| processed(10));
    }
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(3, &CancellationToken::new()).await;
    assert_eq!(summary.examined, 3);
    assert_eq!(db.read_pending_orders(OrderStatusType::pending(), 0).await.unwrap().len(), 5);
}

#[tokio::test]
async fn cancelled_tick_does_nothing() {
    init_logging();
    let db = MemoryDatabase::new();
    submit_all(&db, &ORDER_NUMBERS[..2]).await;

    let mut accrual = MockAccrual::new();
    accrual.expect_resolve().never();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = ReconciliationApi::new(db.clone(), accrual).run_tick(10, &cancel).await;

    assert!(summary.cancelled);
    assert!(!summary.is_error());
    assert_eq!(summary.examined, 0);
    assert_eq!(statuses(&db).await, vec![(18, OrderStatusType::New), (26, OrderStatusType::New)]);
}

/// An accrual service that never answers.
struct StalledAccrual;

impl AccrualService for StalledAccrual {
    async fn resolve(&self, _order_id: &OrderId) -> Result<AccrualOutcome, AccrualApiError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn cancellation_abandons_an_in_flight_request() {
    let (_dir, db) = sqlite_db().await;
    submit_all(&db, &ORDER_NUMBERS[..2]).await;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let reconciler = ReconciliationApi::new(db.clone(), StalledAccrual);
    let summary = tokio::time::timeout(Duration::from_secs(5), reconciler.run_tick(10, &cancel))
        .await
        .expect("the tick should stop once cancelled");

    assert!(summary.cancelled);
    assert!(!summary.is_error());
    assert_eq!(summary.examined, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(statuses(&db).await, vec![(18, OrderStatusType::New), (26, OrderStatusType::New)]);
    assert!(db.read_ledger(&alice(), true).await.unwrap().is_empty());
}
