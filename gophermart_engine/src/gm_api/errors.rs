use accrual_tools::AccrualApiError;
use gm_common::Points;
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderIdError, UserId},
    traits::{LedgerStoreError, UserManagementError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderIdError),
    #[error("Order {0} was submitted by another user")]
    OrderBelongsToAnotherUser(OrderId),
    #[error("Storage error: {0}")]
    StoreError(#[from] LedgerStoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerApiError {
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderIdError),
    #[error("Withdrawal amounts must be positive. Got {0}")]
    InvalidAmount(Points),
    #[error("Insufficient balance. Requested {requested}, but only {current} is available")]
    InsufficientBalance { current: Points, requested: Points },
    #[error("Storage error: {0}")]
    StoreError(LedgerStoreError),
}

impl From<LedgerStoreError> for LedgerApiError {
    fn from(e: LedgerStoreError) -> Self {
        match e {
            LedgerStoreError::InsufficientBalance { current, requested } => {
                Self::InsufficientBalance { current, requested }
            },
            LedgerStoreError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            e => Self::StoreError(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserApiError {
    #[error("Login must not be empty")]
    EmptyLogin,
    #[error("Password must not be empty")]
    EmptyPassword,
    #[error("User {0} already exists")]
    UserAlreadyExists(UserId),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Storage error: {0}")]
    StoreError(String),
}

impl From<UserManagementError> for UserApiError {
    fn from(e: UserManagementError) -> Self {
        match e {
            UserManagementError::UserAlreadyExists(user) => Self::UserAlreadyExists(user),
            UserManagementError::DatabaseError(s) => Self::StoreError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Storage error: {0}")]
    StoreError(#[from] LedgerStoreError),
    #[error("Accrual service error: {0}")]
    AccrualError(#[from] AccrualApiError),
}
