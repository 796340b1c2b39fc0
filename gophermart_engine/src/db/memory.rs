//! An in-process store.
//!
//! Every operation takes the one lock for its whole duration, so each call is atomic with respect to every other call.
//! That is all the ledger guarantees need: a withdrawal's balance check and append happen under the same lock, and so
//! do an order's status update and its accrual entry.
use std::{collections::HashMap, fmt::Debug, sync::Arc};

use chrono::Utc;
use gm_common::Points;
use log::*;
use tokio::sync::Mutex;

use crate::{
    db_types::{
        Balance,
        LedgerEntry,
        NewOrder,
        NewUser,
        NewWithdrawal,
        Order,
        OrderId,
        OrderStatusType,
        UserAccount,
        UserId,
    },
    traits::{LedgerStore, LedgerStoreError, UserManagement, UserManagementError},
};

#[derive(Default)]
struct MemoryStore {
    users: HashMap<UserId, UserAccount>,
    // Insertion order is submission order.
    orders: Vec<Order>,
    order_index: HashMap<OrderId, usize>,
    operations: Vec<LedgerEntry>,
}

impl MemoryStore {
    fn balance(&self, user: &UserId) -> Result<Option<Balance>, LedgerStoreError> {
        let mut entries = self.operations.iter().filter(|e| &e.user_id == user).peekable();
        if entries.peek().is_none() {
            return Ok(None);
        }
        Balance::from_entries(entries)
            .map(Some)
            .ok_or_else(|| LedgerStoreError::DatabaseError(format!("The ledger totals for {user} overflow")))
    }

    fn append(&mut self, user_id: UserId, order_id: OrderId, is_accrual: bool, points: Points) -> LedgerEntry {
        let id = i64::try_from(self.operations.len()).unwrap_or(i64::MAX).saturating_add(1);
        let entry = LedgerEntry { id, user_id, order_id, is_accrual, points, uploaded_at: Utc::now() };
        self.operations.push(entry.clone());
        entry
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<MemoryStore>>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryDatabase {
    async fn ping(&self) -> Result<(), LedgerStoreError> {
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerStoreError> {
        let mut store = self.inner.lock().await;
        if store.order_index.contains_key(&order.order_id) {
            return Err(LedgerStoreError::OrderAlreadyExists(order.order_id));
        }
        let order = Order {
            order_id: order.order_id,
            user_id: order.user_id,
            status: OrderStatusType::New,
            uploaded_at: order.uploaded_at,
            updated_at: order.uploaded_at,
        };
        let index = store.orders.len();
        store.order_index.insert(order.order_id, index);
        store.orders.push(order.clone());
        debug!("🗃️ Order {} has been saved for {}", order.order_id, order.user_id);
        Ok(order)
    }

    async fn read_orders(&self, user: &UserId, order_ids: &[OrderId]) -> Result<Vec<Order>, LedgerStoreError> {
        let store = self.inner.lock().await;
        let orders = store
            .orders
            .iter()
            .filter(|o| &o.user_id == user)
            .filter(|o| order_ids.is_empty() || order_ids.contains(&o.order_id))
            .cloned()
            .collect();
        Ok(orders)
    }

    async fn read_pending_orders(
        &self,
        statuses: &[OrderStatusType],
        limit: usize,
    ) -> Result<Vec<Order>, LedgerStoreError> {
        let store = self.inner.lock().await;
        let limit = if limit == 0 { usize::MAX } else { limit };
        let orders = store
            .orders
            .iter()
            .filter(|o| statuses.is_empty() || statuses.contains(&o.status))
            .take(limit)
            .cloned()
            .collect();
        Ok(orders)
    }

    async fn update_order_and_append_accrual(&self, order: &Order, accrual: Points) -> Result<(), LedgerStoreError> {
        if accrual < Points::default() {
            return Err(LedgerStoreError::InvalidAmount(accrual));
        }
        let mut store = self.inner.lock().await;
        let index = *store.order_index.get(&order.order_id).ok_or(LedgerStoreError::OrderNotFound(order.order_id))?;
        if store.orders[index].status.is_terminal() {
            return Err(LedgerStoreError::OrderIsFinal(order.order_id));
        }
        let owner = store.orders[index].user_id.clone();
        if accrual.is_positive() && !store.balance(&owner)?.unwrap_or_default().can_accrue(accrual) {
            return Err(LedgerStoreError::InvalidAmount(accrual));
        }
        let stored = &mut store.orders[index];
        stored.status = order.status;
        stored.updated_at = order.updated_at;
        trace!("🗃️ Order {} is now {}", order.order_id, order.status);
        if accrual.is_positive() {
            store.append(owner.clone(), order.order_id, true, accrual);
            debug!("🗃️ Credited {accrual} to {owner} for order {}", order.order_id);
        }
        Ok(())
    }

    async fn read_ledger(&self, user: &UserId, is_accrual: bool) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let store = self.inner.lock().await;
        let entries =
            store.operations.iter().filter(|e| &e.user_id == user && e.is_accrual == is_accrual).cloned().collect();
        Ok(entries)
    }

    async fn append_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<LedgerEntry, LedgerStoreError> {
        if !withdrawal.points.is_positive() {
            return Err(LedgerStoreError::InvalidAmount(withdrawal.points));
        }
        let mut store = self.inner.lock().await;
        let current = store.balance(&withdrawal.user_id)?.unwrap_or_default().current;
        if current < withdrawal.points {
            return Err(LedgerStoreError::InsufficientBalance { current, requested: withdrawal.points });
        }
        let entry = store.append(withdrawal.user_id, withdrawal.order_id, false, withdrawal.points);
        debug!("🗃️ {} withdrew {} against order {}", entry.user_id, entry.points, entry.order_id);
        Ok(entry)
    }

    async fn balance(&self, user: &UserId) -> Result<Option<Balance>, LedgerStoreError> {
        let store = self.inner.lock().await;
        store.balance(user)
    }
}

impl UserManagement for MemoryDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<UserAccount, UserManagementError> {
        let mut store = self.inner.lock().await;
        if store.users.contains_key(&user.user_id) {
            return Err(UserManagementError::UserAlreadyExists(user.user_id));
        }
        let account = UserAccount { user_id: user.user_id, password_hash: user.password_hash, created_at: Utc::now() };
        store.users.insert(account.user_id.clone(), account.clone());
        debug!("🗃️ Created user account for {}", account.user_id);
        Ok(account)
    }

    async fn fetch_user(&self, user_id: &UserId) -> Result<Option<UserAccount>, UserManagementError> {
        let store = self.inner.lock().await;
        Ok(store.users.get(user_id).cloned())
    }
}
