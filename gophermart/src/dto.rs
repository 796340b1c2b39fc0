//! JSON shapes for operator output. These follow the customer-facing wire format: point amounts are decimals and
//! timestamps are RFC 3339.
use chrono::SecondsFormat;
use gophermart_engine::{
    db_types::{Balance, LedgerEntry, UserAccount},
    OrderWithAccrual,
    SubmitOrderResult,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
    pub uploaded_at: String,
}

impl From<&OrderWithAccrual> for OrderResponse {
    fn from(value: &OrderWithAccrual) -> Self {
        Self {
            number: value.order.order_id.to_string(),
            status: value.order.status.to_string(),
            accrual: value.accrual.map(|p| p.as_f64()),
            uploaded_at: value.order.uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOrderResponse {
    pub number: String,
    /// `accepted` for a new order, `already_submitted` when the user had submitted it before.
    pub result: &'static str,
}

impl From<&SubmitOrderResult> for SubmitOrderResponse {
    fn from(value: &SubmitOrderResult) -> Self {
        let result = match value {
            SubmitOrderResult::Accepted(_) => "accepted",
            SubmitOrderResult::AlreadySubmitted(_) => "already_submitted",
        };
        Self { number: value.order().order_id.to_string(), result }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResponse {
    pub current: f64,
    pub withdrawn: f64,
}

impl From<Balance> for BalanceResponse {
    fn from(value: Balance) -> Self {
        Self { current: value.current.as_f64(), withdrawn: value.withdrawn.as_f64() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithdrawResponse {
    pub order: String,
    pub sum: f64,
    pub processed_at: String,
}

impl From<&LedgerEntry> for WithdrawResponse {
    fn from(value: &LedgerEntry) -> Self {
        Self {
            order: value.order_id.to_string(),
            sum: value.points.as_f64(),
            processed_at: value.uploaded_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub login: String,
    pub created_at: String,
}

impl From<&UserAccount> for UserResponse {
    fn from(value: &UserAccount) -> Self {
        Self {
            login: value.user_id.to_string(),
            created_at: value.created_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}
