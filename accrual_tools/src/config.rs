use std::time::Duration;

use crate::AccrualApiError;

pub const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual service, e.g. `http://localhost:8090`. A trailing slash is ignored.
    pub base_url: String,
    /// Upper bound on every request, including connection set-up and reading the body.
    pub timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8090".to_string(), timeout: DEFAULT_ACCRUAL_TIMEOUT }
    }
}

impl AccrualConfig {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AccrualApiError::Initialization("The accrual system address is empty".to_string()));
        }
        if timeout.is_zero() {
            return Err(AccrualApiError::Initialization("The accrual request timeout must be positive".to_string()));
        }
        Ok(Self { base_url: base_url.to_string(), timeout })
    }
}
