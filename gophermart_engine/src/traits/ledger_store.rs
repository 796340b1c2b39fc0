use gm_common::Points;
use thiserror::Error;

use crate::db_types::{Balance, LedgerEntry, NewOrder, NewWithdrawal, Order, OrderId, OrderStatusType, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} has already been submitted")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is in a terminal state and cannot be updated")]
    OrderIsFinal(OrderId),
    #[error("Insufficient balance. Requested {requested}, but only {current} is available")]
    InsufficientBalance { current: Points, requested: Points },
    #[error("Ledger amounts must be strictly positive. Got {0}")]
    InvalidAmount(Points),
}

impl From<sqlx::Error> for LedgerStoreError {
    fn from(e: sqlx::Error) -> Self {
        LedgerStoreError::DatabaseError(e.to_string())
    }
}

/// Orders and the points ledger.
///
/// The ledger is append-only. A user's balance is never stored; it is always derived from their entries, so the
/// guarantees below are what keeps balances honest:
///
/// * [`append_withdrawal`](LedgerStore::append_withdrawal) checks the balance and appends in one atomic step.
///   Concurrent withdrawals for the same user can never jointly overdraw the account.
/// * [`update_order_and_append_accrual`](LedgerStore::update_order_and_append_accrual) persists the new order status
///   and its accrual entry together, or not at all.
/// * An order that has reached a terminal status is never updated again, so it can be credited at most once.
#[allow(async_fn_in_trait)]
pub trait LedgerStore: Clone {
    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<(), LedgerStoreError>;

    /// Records a new order with status `NEW`. If the order number is already known (to any user), returns
    /// [`LedgerStoreError::OrderAlreadyExists`] and nothing is changed.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerStoreError>;

    /// Fetches the orders belonging to `user`, oldest first. If `order_ids` is non-empty, only those orders are
    /// returned.
    async fn read_orders(&self, user: &UserId, order_ids: &[OrderId]) -> Result<Vec<Order>, LedgerStoreError>;

    /// Returns up to `limit` orders whose status is one of `statuses`, in submission order. A `limit` of zero means no
    /// limit. An empty `statuses` slice matches every status.
    async fn read_pending_orders(
        &self,
        statuses: &[OrderStatusType],
        limit: usize,
    ) -> Result<Vec<Order>, LedgerStoreError>;

    /// Atomically sets the status of `order` to `order.status` and, if `accrual` is positive, appends an accrual entry
    /// for the order's owner. Either both changes are visible afterwards, or neither is.
    ///
    /// Fails with [`LedgerStoreError::OrderIsFinal`] if the stored order is already terminal and
    /// [`LedgerStoreError::InvalidAmount`] if `accrual` is negative.
    async fn update_order_and_append_accrual(&self, order: &Order, accrual: Points) -> Result<(), LedgerStoreError>;

    /// Ledger entries for `user` of the given kind, oldest first.
    async fn read_ledger(&self, user: &UserId, is_accrual: bool) -> Result<Vec<LedgerEntry>, LedgerStoreError>;

    /// Appends a withdrawal entry if, and only if, the user's current balance covers it. The check and the append are
    /// a single atomic operation. Fails with [`LedgerStoreError::InsufficientBalance`] otherwise.
    async fn append_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<LedgerEntry, LedgerStoreError>;

    /// The user's balance derived from the ledger, or `None` if the user has no entries at all.
    async fn balance(&self, user: &UserId) -> Result<Option<Balance>, LedgerStoreError>;

    /// Releases any resources held by the store.
    async fn close(&mut self) -> Result<(), LedgerStoreError> {
        Ok(())
    }
}
