#![allow(dead_code)]
use accrual_tools::{AccrualApiError, AccrualOutcome, AccrualStatus};
use gm_common::Points;
use gophermart_engine::{db_types::OrderId, AccrualService, SqliteDatabase};
use mockall::mock;
use tempfile::TempDir;

mock! {
    pub Accrual {}
    impl AccrualService for Accrual {
        async fn resolve(&self, order_id: &OrderId) -> Result<AccrualOutcome, AccrualApiError>;
    }
}

/// Luhn-valid order numbers, in ascending order.
pub const ORDER_NUMBERS: [i64; 8] = [18, 26, 34, 42, 59, 67, 75, 83];

pub fn order_id(n: i64) -> OrderId {
    OrderId::try_from(n).expect("test order numbers must be Luhn-valid")
}

pub fn processed(points: i64) -> Result<AccrualOutcome, AccrualApiError> {
    Ok(AccrualOutcome::Resolved { status: AccrualStatus::Processed, accrual: Points::from(points) })
}

pub fn init_logging() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
}

/// A fresh, migrated SQLite database. Keep the directory alive for as long as the database is used.
pub async fn sqlite_db() -> (TempDir, SqliteDatabase) {
    init_logging();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("gophermart.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database");
    (dir, db)
}
