mod support;

use futures_util::future::join_all;
use gm_common::{Points, Secret};
use gophermart_engine::{
    db_types::{OrderIdError, OrderStatusType, UserId},
    LedgerApi,
    LedgerApiError,
    LedgerStore,
    MemoryDatabase,
    OrderFlowApi,
    OrderFlowError,
    SubmitOrderResult,
    UserApi,
    UserApiError,
};
use support::{init_logging, sqlite_db};

fn password(s: &str) -> Secret<String> {
    Secret::new(s.to_string())
}

#[tokio::test]
async fn resubmission_is_idempotent_and_conflicts_are_reported() {
    let (_dir, db) = sqlite_db().await;
    let api = OrderFlowApi::new(db.clone());
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");

    let first = api.submit_order(&alice, "12345678903").await.unwrap();
    assert!(matches!(first, SubmitOrderResult::Accepted(_)));
    assert_eq!(first.order().status, OrderStatusType::New);

    for _ in 0..2 {
        let again = api.submit_order(&alice, " 12345678903 ").await.unwrap();
        assert!(matches!(again, SubmitOrderResult::AlreadySubmitted(_)));
        assert_eq!(again.order().user_id, alice);
        let err = api.submit_order(&bob, "12345678903").await.unwrap_err();
        assert!(matches!(err, OrderFlowError::OrderBelongsToAnotherUser(id) if id.value() == 12345678903));
    }
    assert_eq!(db.read_orders(&alice, &[]).await.unwrap().len(), 1);
    assert!(db.read_orders(&bob, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_submissions_have_one_winner() {
    init_logging();
    let db = MemoryDatabase::new();
    let api = OrderFlowApi::new(db.clone());
    let users: Vec<UserId> = ["alice", "alice", "bob", "carol"].into_iter().map(UserId::from).collect();
    let results = join_all(users.iter().map(|u| api.submit_order(u, "79927398713"))).await;

    let accepted: Vec<_> = results.iter().filter(|r| matches!(r, Ok(SubmitOrderResult::Accepted(_)))).collect();
    assert_eq!(accepted.len(), 1);
    let owner = db.read_pending_orders(&[], 0).await.unwrap()[0].user_id.clone();
    for (user, result) in users.iter().zip(&results) {
        match result {
            Ok(_) => assert_eq!(user, &owner),
            Err(OrderFlowError::OrderBelongsToAnotherUser(_)) => assert_ne!(user, &owner),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}

#[tokio::test]
async fn invalid_order_numbers_never_reach_storage() {
    init_logging();
    let db = MemoryDatabase::new();
    let api = OrderFlowApi::new(db.clone());
    let alice = UserId::from("alice");
    let err = api.submit_order(&alice, "12345678900").await.unwrap_err();
    assert_eq!(err, OrderFlowError::InvalidOrderNumber(OrderIdError::ChecksumFailed(12345678900)));
    for bad in ["", "abc", "-18", "1.8", "99999999999999999999"] {
        let err = api.submit_order(&alice, bad).await.unwrap_err();
        assert!(matches!(err, OrderFlowError::InvalidOrderNumber(OrderIdError::NotANumber(_))), "{bad}: {err}");
    }
    assert!(db.read_pending_orders(&[], 0).await.unwrap().is_empty());

    let ledger = LedgerApi::new(db.clone());
    let err = ledger.withdraw(&alice, "12345678900", Points::from(1)).await.unwrap_err();
    assert!(matches!(err, LedgerApiError::InvalidOrderNumber(_)));
}

#[tokio::test]
async fn empty_ledger_has_zero_balance() {
    init_logging();
    let ledger = LedgerApi::new(MemoryDatabase::new());
    let alice = UserId::from("alice");
    let balance = ledger.balance(&alice).await.unwrap();
    assert_eq!(balance.current, Points::default());
    assert_eq!(balance.withdrawn, Points::default());
    assert!(ledger.withdrawals(&alice).await.unwrap().is_empty());
    assert!(ledger.accruals(&alice).await.unwrap().is_empty());

    let err = ledger.withdraw(&alice, "2377225624", Points::from(751)).await.unwrap_err();
    assert_eq!(err, LedgerApiError::InsufficientBalance { current: Points::default(), requested: Points::from(751) });
    let err = ledger.withdraw(&alice, "2377225624", Points::from(-5)).await.unwrap_err();
    assert_eq!(err, LedgerApiError::InvalidAmount(Points::from(-5)));
    assert!(ledger.withdrawals(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn register_and_authenticate() {
    let (_dir, db) = sqlite_db().await;
    let api = UserApi::new(db);

    let account = api.register("  alice ", &password("hunter2")).await.unwrap();
    assert_eq!(account.user_id, UserId::from("alice"));
    assert_ne!(account.password_hash, "hunter2");

    let err = api.register("alice", &password("other")).await.unwrap_err();
    assert_eq!(err, UserApiError::UserAlreadyExists(UserId::from("alice")));
    assert_eq!(api.register(" ", &password("x")).await.unwrap_err(), UserApiError::EmptyLogin);
    assert_eq!(api.register("bob", &password("  ")).await.unwrap_err(), UserApiError::EmptyPassword);

    let authed = api.authenticate("alice", &password("hunter2")).await.unwrap();
    assert_eq!(authed.user_id, UserId::from("alice"));
    assert_eq!(api.authenticate("alice", &password("hunter3")).await.unwrap_err(), UserApiError::InvalidCredentials);
    assert_eq!(api.authenticate("mallory", &password("hunter2")).await.unwrap_err(), UserApiError::InvalidCredentials);
}
