use std::fmt::Debug;

use gm_common::Points;
use log::*;

use crate::{
    db_types::{Balance, LedgerEntry, NewWithdrawal, OrderId, UserId},
    gm_api::errors::LedgerApiError,
    traits::LedgerStore,
};

/// Balances and withdrawals. The balance is always derived from the ledger.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: LedgerStore
{
    /// The user's current balance and total withdrawn. A user with no ledger entries has a zero balance.
    pub async fn balance(&self, user: &UserId) -> Result<Balance, LedgerApiError> {
        let balance = self.db.balance(user).await?.unwrap_or_default();
        trace!("💰️ Balance for {user}: {} current, {} withdrawn", balance.current, balance.withdrawn);
        Ok(balance)
    }

    /// Spends `amount` points against `order_number`.
    ///
    /// The store checks the balance and appends the withdrawal as one atomic step, so this is safe to call
    /// concurrently for the same user. An insufficient balance is reported as [`LedgerApiError::InsufficientBalance`]
    /// and leaves the ledger untouched.
    pub async fn withdraw(
        &self,
        user: &UserId,
        order_number: &str,
        amount: Points,
    ) -> Result<LedgerEntry, LedgerApiError> {
        let order_id = order_number.parse::<OrderId>()?;
        if !amount.is_positive() {
            return Err(LedgerApiError::InvalidAmount(amount));
        }
        let result = self.db.append_withdrawal(NewWithdrawal::new(user.clone(), order_id, amount)).await;
        match &result {
            Ok(_) => info!("💰️ {user} withdrew {amount} against order {order_id}"),
            Err(e) => warn!("💰️ Withdrawal of {amount} by {user} against order {order_id} was refused. {e}"),
        }
        Ok(result?)
    }

    /// The user's withdrawals, oldest first.
    pub async fn withdrawals(&self, user: &UserId) -> Result<Vec<LedgerEntry>, LedgerApiError> {
        Ok(self.db.read_ledger(user, false).await?)
    }

    /// The user's accruals, oldest first.
    pub async fn accruals(&self, user: &UserId) -> Result<Vec<LedgerEntry>, LedgerApiError> {
        Ok(self.db.read_ledger(user, true).await?)
    }
}
