use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::{AccrualApiError, AccrualConfig, AccrualOutcome, AccrualResponse};

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualApi ({})", self.config.base_url)
    }
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, order_number: i64) -> String {
        format!("{}/api/orders/{order_number}", self.config.base_url)
    }

    /// Asks the accrual service about a single order and classifies the reply.
    ///
    /// | Reply                 | Result                                     |
    /// |-----------------------|--------------------------------------------|
    /// | `200` + JSON body     | `Ok(Resolved { .. })` (or `Pending` if the body names no order) |
    /// | `204 No Content`      | `Ok(Pending)`                              |
    /// | `429 Too Many Requests` | `Ok(RateLimited { .. })`                 |
    /// | anything else         | `Err(QueryError { .. })`                   |
    ///
    /// Transport failures, timeouts and undecodable bodies are also errors.
    pub async fn fetch_order(&self, order_number: i64) -> Result<AccrualOutcome, AccrualApiError> {
        let url = self.url(order_number);
        trace!("🌐️ Querying accrual service: {url}");
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                AccrualApiError::Timeout(e.to_string())
            } else {
                AccrualApiError::RestResponseError(e.to_string())
            }
        })?;
        let status = response.status();
        match status {
            StatusCode::OK => {
                let body = response.text().await.map_err(|e| AccrualApiError::RestResponseError(e.to_string()))?;
                trace!("🌐️ Accrual service reply for order {order_number}: {body}");
                let reply = serde_json::from_str::<AccrualResponse>(&body)
                    .map_err(|e| AccrualApiError::JsonError(format!("{e}. Body: {body}")))?;
                let outcome = AccrualOutcome::try_from(reply)?;
                debug!("🌐️ Order {order_number}: {outcome:?}");
                Ok(outcome)
            },
            StatusCode::NO_CONTENT => {
                debug!("🌐️ Order {order_number} is not known to the accrual service yet");
                Ok(AccrualOutcome::Pending)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                warn!("🌐️ The accrual service is rate limiting requests. Retry after: {retry_after:?}");
                Ok(AccrualOutcome::RateLimited { retry_after })
            },
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(AccrualApiError::QueryError { status: status.as_u16(), message })
            },
        }
    }
}
