use accrual_tools::AccrualApiError;
use gophermart_engine::{
    LedgerApiError,
    LedgerStoreError,
    OrderFlowError,
    SqliteDatabaseError,
    UserApiError,
    UserManagementError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid configuration. {0}")]
    ConfigurationError(String),
    #[error("Could not initialize. {0}")]
    InitializeError(String),
    #[error("Storage error. {0}")]
    DatabaseError(String),
    #[error("Accrual service error. {0}")]
    AccrualError(#[from] AccrualApiError),
    #[error("{0}")]
    OrderError(#[from] OrderFlowError),
    #[error("{0}")]
    LedgerError(#[from] LedgerApiError),
    #[error("{0}")]
    UserError(#[from] UserApiError),
    #[error("Could not format output. {0}")]
    OutputError(#[from] serde_json::Error),
}

impl From<SqliteDatabaseError> for AppError {
    fn from(e: SqliteDatabaseError) -> Self {
        Self::InitializeError(e.to_string())
    }
}

impl From<LedgerStoreError> for AppError {
    fn from(e: LedgerStoreError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<UserManagementError> for AppError {
    fn from(e: UserManagementError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl AppError {
    /// Process exit code. Refusals the caller can act on get their own codes, loosely following the HTTP status the
    /// same refusal would carry: 2 for an insufficient balance (402), 3 for a conflict (409), 4 for bad input (422)
    /// and 5 for a failed sign-in (401).
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::LedgerError(LedgerApiError::InsufficientBalance { .. }) => 2,
            Self::OrderError(OrderFlowError::OrderBelongsToAnotherUser(_)) => 3,
            Self::UserError(UserApiError::UserAlreadyExists(_)) => 3,
            Self::OrderError(OrderFlowError::InvalidOrderNumber(_)) |
            Self::LedgerError(LedgerApiError::InvalidOrderNumber(_) | LedgerApiError::InvalidAmount(_)) |
            Self::UserError(UserApiError::EmptyLogin | UserApiError::EmptyPassword) => 4,
            Self::UserError(UserApiError::InvalidCredentials) => 5,
            _ => 1,
        }
    }
}
