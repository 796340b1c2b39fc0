use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The accrual service did not reply within the configured timeout: {0}")]
    Timeout(String),
    #[error("Could not reach the accrual service: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The accrual service reported an unknown order status: {0}")]
    UnknownStatus(String),
    #[error("Invalid accrual amount: {0}")]
    InvalidAccrualAmount(String),
}
