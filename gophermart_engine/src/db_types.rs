use std::{fmt::Display, str::FromStr};

use accrual_tools::AccrualStatus;
use chrono::{DateTime, Utc};
use gm_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::luhn;

//--------------------------------------        UserId         ---------------------------------------------------------
/// The login a customer registered with. Logins are unique and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// A positive order number whose decimal digits pass the Luhn checksum.
///
/// The only ways to build one are [`OrderId::try_from`] and [`str::parse`], both of which validate. Values read back
/// from a store were validated on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "i64", into = "i64")]
pub struct OrderId(i64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderIdError {
    #[error("Order number is not a positive integer: {0}")]
    NotANumber(String),
    #[error("Order number fails the Luhn check: {0}")]
    ChecksumFailed(i64),
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for OrderId {
    type Error = OrderIdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(OrderIdError::NotANumber(value.to_string()));
        }
        if !luhn::is_valid(value) {
            return Err(OrderIdError::ChecksumFailed(value));
        }
        Ok(Self(value))
    }
}

impl From<OrderId> for i64 {
    fn from(value: OrderId) -> Self {
        value.0
    }
}

impl FromStr for OrderId {
    type Err = OrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderIdError::NotANumber(s.to_string()));
        }
        let value = s.parse::<i64>().map_err(|_| OrderIdError::NotANumber(s.to_string()))?;
        Self::try_from(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// Submitted by a customer. The accrual service has not reported on it yet.
    New,
    /// The accrual service knows about the order but has not started calculating.
    Registered,
    /// The accrual service is calculating the reward.
    Processing,
    /// The accrual service rejected the order. No points will be awarded.
    Invalid,
    /// The reward has been calculated and posted to the ledger.
    Processed,
}

impl OrderStatusType {
    /// Orders in one of these states are polled by the reconciliation loop.
    pub fn pending() -> &'static [OrderStatusType] {
        &[Self::New, Self::Registered, Self::Processing]
    }

    /// Terminal orders are never polled again, and their status never changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::New => "NEW",
            Self::Registered => "REGISTERED",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<AccrualStatus> for OrderStatusType {
    fn from(value: AccrualStatus) -> Self {
        match value {
            AccrualStatus::Registered => Self::Registered,
            AccrualStatus::Processing => Self::Processing,
            AccrualStatus::Invalid => Self::Invalid,
            AccrualStatus::Processed => Self::Processed,
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatusType,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A copy of this order carrying a new status. Nothing is persisted.
    pub fn with_status(&self, status: OrderStatusType) -> Self {
        Self { status, updated_at: Utc::now(), ..self.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub uploaded_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, user_id: UserId) -> Self {
        Self { order_id, user_id, uploaded_at: Utc::now() }
    }
}

//--------------------------------------     LedgerEntry       ---------------------------------------------------------
/// One immutable row of the points ledger. Entries are only ever appended.
///
/// `points` is always strictly positive. The direction is carried by `is_accrual`: accruals credit the user,
/// everything else is a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub is_accrual: bool,
    pub points: Points,
    pub uploaded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The effect of this entry on the user's current balance.
    pub fn signed_points(&self) -> Points {
        if self.is_accrual {
            self.points
        } else {
            -self.points
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: UserId,
    pub order_id: OrderId,
    pub points: Points,
    pub uploaded_at: DateTime<Utc>,
}

impl NewWithdrawal {
    pub fn new(user_id: UserId, order_id: OrderId, points: Points) -> Self {
        Self { user_id, order_id, points, uploaded_at: Utc::now() }
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
/// A user's balance as derived from the ledger. `current` is accruals minus withdrawals, `withdrawn` is the sum of
/// all withdrawals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

impl Balance {
    /// Sums the entries. Returns `None` if either total does not fit in a [`Points`].
    pub fn from_entries<'a, I: IntoIterator<Item = &'a LedgerEntry>>(entries: I) -> Option<Self> {
        entries.into_iter().try_fold(Self::default(), |acc, e| {
            let current = acc.current.checked_add(e.signed_points())?;
            let withdrawn = if e.is_accrual { acc.withdrawn } else { acc.withdrawn.checked_add(e.points)? };
            Some(Self { current, withdrawn })
        })
    }

    /// Whether crediting `accrual` keeps every total of this ledger representable. Everything ever accrued is
    /// `current + withdrawn`, and both totals are bounded by it.
    pub fn can_accrue(&self, accrual: Points) -> bool {
        self.current.checked_add(self.withdrawn).and_then(|total| total.checked_add(accrual)).is_some()
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserAccount {
    pub user_id: UserId,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: UserId,
    pub password_hash: String,
}
