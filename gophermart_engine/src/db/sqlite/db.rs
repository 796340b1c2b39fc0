use std::fmt::Debug;

use gm_common::Points;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{ledger, new_pool, orders, users, SqliteDatabaseError};
use crate::{
    db_types::{Balance, LedgerEntry, NewOrder, NewUser, NewWithdrawal, Order, OrderId, OrderStatusType, UserAccount, UserId},
    traits::{LedgerStore, LedgerStoreError, UserManagement, UserManagementError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating it if necessary, and brings the schema up to date.
    ///
    /// Note that `sqlite::memory:` gives every pooled connection its own private database. Use a file URL if more
    /// than one connection is needed.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        let db = Self { url: url.to_string(), pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Direct access to the connection pool. Bypassing the store's API also bypasses its guarantees.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LedgerStore for SqliteDatabase {
    async fn ping(&self) -> Result<(), LedgerStoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn read_orders(&self, user: &UserId, order_ids: &[OrderId]) -> Result<Vec<Order>, LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user, order_ids, &mut conn).await
    }

    async fn read_pending_orders(
        &self,
        statuses: &[OrderStatusType],
        limit: usize,
    ) -> Result<Vec<Order>, LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_with_status(statuses, limit, &mut conn).await
    }

    /// The status update and the accrual entry share one transaction. If either statement fails, or this future is
    /// dropped before the commit, both are rolled back.
    ///
    /// The `UPDATE` runs first, so the transaction holds the write lock before it reads anything.
    async fn update_order_and_append_accrual(&self, order: &Order, accrual: Points) -> Result<(), LedgerStoreError> {
        if accrual < Points::default() {
            return Err(LedgerStoreError::InvalidAmount(accrual));
        }
        let mut tx = self.pool.begin().await?;
        let owner = orders::update_status(order, &mut tx).await?;
        if accrual.is_positive() {
            let balance = ledger::fetch_balance(&owner, &mut tx).await?.unwrap_or_default();
            if !balance.can_accrue(accrual) {
                return Err(LedgerStoreError::InvalidAmount(accrual));
            }
            ledger::insert_accrual(&owner, order.order_id, accrual, order.updated_at, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn read_ledger(&self, user: &UserId, is_accrual: bool) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_entries(user, is_accrual, &mut conn).await
    }

    /// The conditional insert is the transaction's first statement, so the balance it checks cannot change before the
    /// insert lands. A refused withdrawal reports the balance read under the same lock.
    async fn append_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<LedgerEntry, LedgerStoreError> {
        if !withdrawal.points.is_positive() {
            return Err(LedgerStoreError::InvalidAmount(withdrawal.points));
        }
        let mut tx = self.pool.begin().await?;
        match ledger::insert_withdrawal_if_covered(&withdrawal, &mut tx).await? {
            Some(entry) => {
                tx.commit().await?;
                debug!("🗃️ {} withdrew {} against order {}", entry.user_id, entry.points, entry.order_id);
                Ok(entry)
            },
            None => {
                let current = ledger::fetch_balance(&withdrawal.user_id, &mut tx).await?.unwrap_or_default().current;
                tx.rollback().await?;
                Err(LedgerStoreError::InsufficientBalance { current, requested: withdrawal.points })
            },
        }
    }

    async fn balance(&self, user: &UserId) -> Result<Option<Balance>, LedgerStoreError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_balance(user, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), LedgerStoreError> {
        self.pool.close().await;
        info!("🗃️ Database connections closed");
        Ok(())
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<UserAccount, UserManagementError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, user_id: &UserId) -> Result<Option<UserAccount>, UserManagementError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }
}
