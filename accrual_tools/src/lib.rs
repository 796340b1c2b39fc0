//! Client for the external accrual (loyalty scoring) service.
//!
//! The service exposes a single read endpoint, `GET {base}/api/orders/{number}`, which reports how far it has got with
//! scoring an order and, once processed, how many points the order earned. [`AccrualApi::fetch_order`] classifies
//! every possible reply into an [`AccrualOutcome`], so that callers only ever see errors for genuinely unexpected
//! conditions.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::AccrualApi;
pub use config::{AccrualConfig, DEFAULT_ACCRUAL_TIMEOUT};
pub use data_objects::{AccrualOutcome, AccrualResponse, AccrualStatus};
pub use error::AccrualApiError;
