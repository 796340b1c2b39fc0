//! # Storage and service contracts
//!
//! The engine is agnostic about where orders, the points ledger and user accounts live. Backends implement the traits
//! in this module and the public APIs in [`crate::gm_api`] are generic over them.
//!
//! * [`LedgerStore`] owns orders and the append-only points ledger. It is where the consistency guarantees live:
//!   withdrawals are checked and appended atomically, and order status updates are committed together with their
//!   accrual entry.
//! * [`UserManagement`] stores user accounts and their password hashes.
//! * [`AccrualService`] is the outbound seam to the external accrual calculator.
mod accrual_service;
mod ledger_store;
mod user_management;

pub use accrual_service::AccrualService;
pub use ledger_store::{LedgerStore, LedgerStoreError};
pub use user_management::{UserManagement, UserManagementError};
