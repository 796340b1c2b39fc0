use std::{collections::HashMap, fmt::Debug};

use gm_common::Points;
use log::*;

use crate::{
    db_types::{NewOrder, OrderId, UserId},
    gm_api::{
        errors::OrderFlowError,
        order_objects::{OrderWithAccrual, SubmitOrderResult},
    },
    traits::{LedgerStore, LedgerStoreError},
};

/// `OrderFlowApi` accepts order submissions from customers and reports on them.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: LedgerStore
{
    /// Submits an order number on behalf of `user`.
    ///
    /// The number is Luhn-checked before anything is stored. The insert itself is optimistic: order numbers are unique
    /// in the store, so a conflict tells us the number is already known, and only then do we look up who owns it.
    ///
    /// * A new order is stored with status `NEW` and returned as [`SubmitOrderResult::Accepted`].
    /// * Resubmitting one's own order is harmless and returns [`SubmitOrderResult::AlreadySubmitted`].
    /// * Submitting somebody else's order fails with [`OrderFlowError::OrderBelongsToAnotherUser`].
    pub async fn submit_order(&self, user: &UserId, order_number: &str) -> Result<SubmitOrderResult, OrderFlowError> {
        let order_id = order_number.parse::<OrderId>()?;
        match self.db.insert_order(NewOrder::new(order_id, user.clone())).await {
            Ok(order) => {
                info!("🔄️📦️ Order {order_id} accepted for {user}");
                Ok(SubmitOrderResult::Accepted(order))
            },
            Err(LedgerStoreError::OrderAlreadyExists(_)) => {
                let existing = self.db.read_orders(user, &[order_id]).await?;
                match existing.into_iter().next() {
                    Some(order) => {
                        debug!("🔄️📦️ {user} resubmitted order {order_id}. Nothing to do.");
                        Ok(SubmitOrderResult::AlreadySubmitted(order))
                    },
                    None => {
                        warn!("🔄️📦️ {user} tried to submit order {order_id}, which belongs to someone else");
                        Err(OrderFlowError::OrderBelongsToAnotherUser(order_id))
                    },
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    /// All of `user`'s orders, oldest first, each with the sum of the accruals posted for it.
    pub async fn orders_for_user(&self, user: &UserId) -> Result<Vec<OrderWithAccrual>, OrderFlowError> {
        let orders = self.db.read_orders(user, &[]).await?;
        let accruals = self.db.read_ledger(user, true).await?;
        let mut earned = HashMap::<OrderId, Points>::new();
        for entry in accruals {
            *earned.entry(entry.order_id).or_default() += entry.points;
        }
        trace!("🔄️📦️ {user} has {} orders and {} accruals", orders.len(), earned.len());
        let result = orders
            .into_iter()
            .map(|order| {
                let accrual = earned.get(&order.order_id).copied();
                OrderWithAccrual { order, accrual }
            })
            .collect();
        Ok(result)
    }
}
