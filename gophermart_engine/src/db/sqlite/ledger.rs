//! The append-only points ledger.
//!
//! There are no `UPDATE` or `DELETE` statements in this module, and triggers on the `operations` table reject them
//! anyway.
use chrono::{DateTime, Utc};
use gm_common::Points;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Balance, LedgerEntry, NewWithdrawal, OrderId, UserId},
    traits::LedgerStoreError,
};

const ENTRY_COLUMNS: &str = "id, user_id, order_id, is_accrual, points, uploaded_at";

/// Appends an accrual entry. Callers are expected to have validated that `points` is positive; the table's CHECK
/// constraint rejects anything else.
pub async fn insert_accrual(
    user_id: &UserId,
    order_id: OrderId,
    points: Points,
    uploaded_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<LedgerEntry, LedgerStoreError> {
    let sql = format!(
        "INSERT INTO operations (user_id, order_id, is_accrual, points, uploaded_at) VALUES (?, ?, TRUE, ?, ?) \
         RETURNING {ENTRY_COLUMNS}"
    );
    let entry = sqlx::query_as::<_, LedgerEntry>(&sql)
        .bind(user_id)
        .bind(order_id)
        .bind(points)
        .bind(uploaded_at)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Credited {points} to {user_id} for order {order_id}");
    Ok(entry)
}

/// Appends a withdrawal entry only if the user's balance covers it.
///
/// The balance check is a sub-select inside the `INSERT` itself, so SQLite evaluates it under the same write lock
/// as the insert. Returns `None` (and writes nothing) when the balance is too low.
pub async fn insert_withdrawal_if_covered(
    withdrawal: &NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Option<LedgerEntry>, LedgerStoreError> {
    let sql = format!(
        r#"
        INSERT INTO operations (user_id, order_id, is_accrual, points, uploaded_at)
        SELECT ?1, ?2, FALSE, ?3, ?4
        WHERE (
            SELECT COALESCE(SUM(CASE WHEN is_accrual THEN points ELSE -points END), 0)
            FROM operations
            WHERE user_id = ?1
        ) >= ?3
        RETURNING {ENTRY_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, LedgerEntry>(&sql)
        .bind(&withdrawal.user_id)
        .bind(withdrawal.order_id)
        .bind(withdrawal.points)
        .bind(withdrawal.uploaded_at)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

pub async fn fetch_entries(
    user_id: &UserId,
    is_accrual: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM operations WHERE user_id = ? AND is_accrual = ? ORDER BY id ASC");
    let entries = sqlx::query_as::<_, LedgerEntry>(&sql).bind(user_id).bind(is_accrual).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} ledger entries for {user_id}", entries.len());
    Ok(entries)
}

/// Sums the user's ledger. Returns `None` if the user has no entries.
pub async fn fetch_balance(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<Balance>, LedgerStoreError> {
    let (entries, current, withdrawn) = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN is_accrual THEN points ELSE -points END), 0),
            COALESCE(SUM(CASE WHEN is_accrual THEN 0 ELSE points END), 0)
        FROM operations
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    if entries == 0 {
        return Ok(None);
    }
    Ok(Some(Balance { current: Points::from(current), withdrawn: Points::from(withdrawn) }))
}
