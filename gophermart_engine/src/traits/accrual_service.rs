use accrual_tools::{AccrualApi, AccrualApiError, AccrualOutcome};

use crate::db_types::OrderId;

/// Resolves the accrual status of a single order.
///
/// [`AccrualApi`] is the production implementation. The reconciliation loop only depends on this trait, so tests can
/// script the service's replies.
#[allow(async_fn_in_trait)]
pub trait AccrualService {
    async fn resolve(&self, order_id: &OrderId) -> Result<AccrualOutcome, AccrualApiError>;
}

impl AccrualService for AccrualApi {
    async fn resolve(&self, order_id: &OrderId) -> Result<AccrualOutcome, AccrualApiError> {
        self.fetch_order(order_id.value()).await
    }
}
