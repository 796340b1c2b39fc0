use log::*;
use tempfile::TempDir;

use crate::SqliteDatabase;

/// A migrated SQLite database in a temporary directory. The directory, and the database with it, is removed when this
/// value is dropped.
pub struct TestDatabase {
    pub db: SqliteDatabase,
    pub url: String,
    _dir: TempDir,
}

/// Loads `.env.test` if present, initialises logging and creates a fresh, fully migrated database.
pub async fn prepare_test_env() -> TestDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("gophermart_test.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database");
    info!("🚀️ Test database ready at {url}");
    TestDatabase { db, url, _dir: dir }
}
