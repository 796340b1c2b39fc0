use gm_common::Points;
use serde::Serialize;

use crate::db_types::Order;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// The order is new and has been stored with status `NEW`.
    Accepted(Order),
    /// The same user had already submitted this order. Nothing was changed.
    AlreadySubmitted(Order),
}

impl SubmitOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Accepted(o) | Self::AlreadySubmitted(o) => o,
        }
    }
}

/// An order together with the points it earned, if any have been posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithAccrual {
    #[serde(flatten)]
    pub order: Order,
    pub accrual: Option<Points>,
}
