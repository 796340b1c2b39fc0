use std::{fmt::Debug, time::Duration};

use accrual_tools::{AccrualOutcome, AccrualStatus};
use gm_common::Points;
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    db_types::{Order, OrderStatusType},
    gm_api::errors::ReconciliationError,
    traits::{AccrualService, LedgerStore, LedgerStoreError},
};

/// The accrual service asked us to slow down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// How long the service asked us to wait, if it said.
    pub retry_after: Option<Duration>,
}

/// What happened during one reconciliation tick.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    /// Orders for which the accrual service was consulted.
    pub examined: usize,
    /// Orders whose status or ledger changed.
    pub updated: usize,
    /// Total points credited during the tick.
    pub accrued: Points,
    /// Set if the batch stopped early because the service is rate limiting us.
    pub rate_limited: Option<RateLimit>,
    /// Set if the batch stopped early because of an error. The remaining orders are retried on the next tick.
    pub halted_by: Option<ReconciliationError>,
    /// Set if the tick was abandoned because the cancellation token fired.
    pub cancelled: bool,
}

impl TickSummary {
    pub fn is_error(&self) -> bool {
        self.halted_by.is_some()
    }
}

/// Advances pending orders toward a terminal status and posts their accruals.
///
/// Each call to [`run_tick`](ReconciliationApi::run_tick) fetches one batch of pending orders and asks the accrual
/// service about each of them in turn. Orders are never polled concurrently; the accrual service rate-limits per
/// caller. Nothing is remembered between ticks beyond what is in the store, so an order that is not resolved this
/// time is simply picked up again next time.
pub struct ReconciliationApi<B, A> {
    db: B,
    accrual: A,
}

impl<B, A> Debug for ReconciliationApi<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, A> ReconciliationApi<B, A> {
    pub fn new(db: B, accrual: A) -> Self {
        Self { db, accrual }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

enum Step {
    Updated(Points),
    Unchanged,
}

impl<B, A> ReconciliationApi<B, A>
where
    B: LedgerStore,
    A: AccrualService,
{
    /// Runs one pass over up to `limit` pending orders.
    ///
    /// | Accrual outcome                | Effect on this order                        | Effect on the batch |
    /// |--------------------------------|---------------------------------------------|---------------------|
    /// | `Resolved` as `PROCESSED`      | status updated, accrual posted if non-zero  | continue            |
    /// | `Resolved` with another status | status updated, any reported amount ignored | continue            |
    /// | `Pending`                      | none                                        | continue            |
    /// | `RateLimited`                  | none                                        | stop, not an error  |
    /// | error                          | none                                        | stop, reported      |
    ///
    /// Points are only ever posted with the terminal `PROCESSED` status, so an order is credited at most once.
    ///
    /// The status update and its accrual entry are committed together by the store, so stopping at any point leaves
    /// every order either fully updated or untouched. The tick also stops, without error, as soon as `cancel` fires.
    /// An in-flight request to the accrual service is abandoned in that case.
    ///
    /// Failing to read the batch in the first place is also reported through [`TickSummary::halted_by`].
    pub async fn run_tick(&self, limit: usize, cancel: &CancellationToken) -> TickSummary {
        let mut summary = TickSummary::default();
        let batch = match self.db.read_pending_orders(OrderStatusType::pending(), limit).await {
            Ok(batch) => batch,
            Err(e) => {
                summary.halted_by = Some(e.into());
                return summary;
            },
        };
        trace!("🔄️ {} pending orders in this batch", batch.len());
        for order in batch {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                outcome = self.accrual.resolve(&order.order_id) => outcome,
            };
            summary.examined += 1;
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("🔄️ Could not resolve order {}. Abandoning this batch. {e}", order.order_id);
                    summary.halted_by = Some(e.into());
                    break;
                },
            };
            match outcome {
                AccrualOutcome::Pending => {
                    trace!("🔄️ Order {} is still pending", order.order_id);
                },
                AccrualOutcome::RateLimited { retry_after } => {
                    info!("🔄️ Rate limited while resolving order {}. Abandoning this batch.", order.order_id);
                    summary.rate_limited = Some(RateLimit { retry_after });
                    break;
                },
                AccrualOutcome::Resolved { status, accrual } => match self.apply(&order, status, accrual).await {
                    Ok(Step::Updated(points)) => {
                        summary.updated += 1;
                        summary.accrued += points;
                    },
                    Ok(Step::Unchanged) => {},
                    Err(e) => {
                        warn!("🔄️ Could not update order {}. Abandoning this batch. {e}", order.order_id);
                        summary.halted_by = Some(e);
                        break;
                    },
                },
            }
        }
        debug!(
            "🔄️ Tick complete. {} examined, {} updated, {} accrued",
            summary.examined, summary.updated, summary.accrued
        );
        summary
    }

    async fn apply(&self, order: &Order, status: AccrualStatus, accrual: Points) -> Result<Step, ReconciliationError> {
        let status = OrderStatusType::from(status);
        // Points are only posted once the calculation is final. Anything the service reports alongside an
        // intermediate status would be credited a second time when the order is processed.
        let accrual = if status == OrderStatusType::Processed {
            accrual
        } else {
            if !accrual.is_zero() {
                warn!("🔄️ Ignoring accrual of {accrual} reported for order {} with status {status}", order.order_id);
            }
            Points::default()
        };
        if status == order.status && accrual.is_zero() {
            trace!("🔄️ Order {} is unchanged at {status}", order.order_id);
            return Ok(Step::Unchanged);
        }
        match self.db.update_order_and_append_accrual(&order.with_status(status), accrual).await {
            Ok(()) => {
                info!("🔄️ Order {} for {} is now {status}. Accrued {accrual}", order.order_id, order.user_id);
                Ok(Step::Updated(accrual))
            },
            Err(LedgerStoreError::OrderIsFinal(id)) => {
                warn!("🔄️ Order {id} reached a terminal status elsewhere. Leaving it alone.");
                Ok(Step::Unchanged)
            },
            Err(e) => Err(e.into()),
        }
    }
}
