use std::time::Duration;

use gophermart_engine::{AccrualService, LedgerStore, ReconciliationApi, TickSummary};
use log::*;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Runs reconciliation ticks until `cancel` fires.
///
/// The first tick starts straight away. After each tick the worker sleeps for the poll interval, or for longer if the
/// accrual service asked for more time with `Retry-After`. A failed tick is logged and the worker carries on; nothing
/// short of cancellation stops it.
pub async fn run_accrual_worker<B, A>(api: &ReconciliationApi<B, A>, config: &WorkerConfig, cancel: &CancellationToken)
where
    B: LedgerStore,
    A: AccrualService,
{
    info!(
        "🕰️ Accrual worker started. Polling every {:?}, up to {} orders per tick",
        config.poll_interval, config.batch_limit
    );
    while !cancel.is_cancelled() {
        let summary = api.run_tick(config.batch_limit, cancel).await;
        log_summary(&summary);
        let delay = next_delay(&summary, config.poll_interval);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {},
        }
    }
    info!("🕰️ Accrual worker stopped");
}

/// How long to wait before the next tick. A rate-limited tick waits for at least as long as the service asked.
pub fn next_delay(summary: &TickSummary, poll_interval: Duration) -> Duration {
    match summary.rate_limited.and_then(|r| r.retry_after) {
        Some(retry_after) => retry_after.max(poll_interval),
        None => poll_interval,
    }
}

fn log_summary(summary: &TickSummary) {
    if let Some(e) = &summary.halted_by {
        error!("🕰️ Reconciliation tick failed after updating {} orders. {e}", summary.updated);
        return;
    }
    if summary.cancelled {
        info!("🕰️ Reconciliation tick interrupted after updating {} orders", summary.updated);
        return;
    }
    if let Some(limit) = summary.rate_limited {
        warn!(
            "🕰️ Rate limited by the accrual service after updating {} orders. Retry after {:?}",
            summary.updated, limit.retry_after
        );
        return;
    }
    if summary.examined == 0 {
        debug!("🕰️ No pending orders");
    } else {
        info!(
            "🕰️ {} orders examined, {} updated, {} points accrued",
            summary.examined, summary.updated, summary.accrued
        );
    }
}

#[cfg(test)]
mod test {
    use gophermart_engine::RateLimit;

    use super::*;

    #[test]
    fn rate_limits_stretch_the_delay() {
        let interval = Duration::from_secs(5);
        assert_eq!(next_delay(&TickSummary::default(), interval), interval);
        let mut summary = TickSummary { rate_limited: Some(RateLimit { retry_after: None }), ..Default::default() };
        assert_eq!(next_delay(&summary, interval), interval);
        summary.rate_limited = Some(RateLimit { retry_after: Some(Duration::from_secs(60)) });
        assert_eq!(next_delay(&summary, interval), Duration::from_secs(60));
        summary.rate_limited = Some(RateLimit { retry_after: Some(Duration::from_secs(1)) });
        assert_eq!(next_delay(&summary, interval), interval);
    }
}
