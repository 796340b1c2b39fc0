//! Storage backends.
//!
//! * [`memory`] keeps everything in process behind a single lock. It is the default when no database is configured,
//!   and is handy in tests.
//! * [`sqlite`] persists to a SQLite file. The ledger invariants are enforced inside the database itself.
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
