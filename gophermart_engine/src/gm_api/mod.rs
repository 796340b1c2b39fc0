//! # Gophermart engine public API
//!
//! Each API wraps a storage backend that implements the traits it needs, and is otherwise stateless:
//!
//! * [`order_flow_api`] accepts order submissions and lists a user's orders with their accruals.
//! * [`ledger_api`] reports balances and commits withdrawals.
//! * [`user_api`] registers users and checks their credentials.
//! * [`reconciliation_api`] runs one pass of the accrual reconciliation loop.
//!
//! ```rust,ignore
//! use gophermart_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/gophermart.db", 5).await?;
//! let api = LedgerApi::new(db);
//! let balance = api.balance(&"alice".into()).await?;
//! ```
pub mod errors;
pub mod ledger_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod reconciliation_api;
pub mod user_api;
