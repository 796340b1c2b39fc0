//! Gophermart Engine
//!
//! The core of the Gophermart loyalty system: customers submit order numbers, an external accrual service decides how
//! many points each order earns, and customers spend their points by withdrawing them against new orders.
//!
//! The library is divided into three sections:
//! 1. Storage ([`mod@db`] and [`mod@traits`]). [`LedgerStore`] owns orders and the append-only points ledger, and is
//!    where the consistency guarantees live. Two backends are provided: [`SqliteDatabase`] and [`MemoryDatabase`].
//! 2. The public API ([`mod@gm_api`]). [`OrderFlowApi`], [`LedgerApi`] and [`UserApi`] serve customer requests.
//!    [`ReconciliationApi`] runs one pass of the background loop that polls the accrual service.
//! 3. Domain types ([`mod@db_types`]) shared by both.
//!
//! Point amounts are fixed-point integers ([`gm_common::Points`]) everywhere inside the engine.
pub mod db;
pub mod db_types;
pub mod helpers;
mod gm_api;
mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use db::memory::MemoryDatabase;
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use gm_api::{
    errors::{LedgerApiError, OrderFlowError, ReconciliationError, UserApiError},
    ledger_api::LedgerApi,
    order_flow_api::OrderFlowApi,
    order_objects::{OrderWithAccrual, SubmitOrderResult},
    reconciliation_api::{RateLimit, ReconciliationApi, TickSummary},
    user_api::UserApi,
};
pub use traits::{AccrualService, LedgerStore, LedgerStoreError, UserManagement, UserManagementError};
