use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, UserId},
    traits::LedgerStoreError,
};

const ORDER_COLUMNS: &str = "order_id, user_id, status, uploaded_at, updated_at";

/// Inserts a new order with status `NEW`. The `order_id` column is unique, so a second submission of the same number
/// fails with [`LedgerStoreError::OrderAlreadyExists`] whoever submitted it.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerStoreError> {
    let sql = format!(
        "INSERT INTO orders (order_id, user_id, status, uploaded_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING \
         {ORDER_COLUMNS}"
    );
    let result = sqlx::query_as::<_, Order>(&sql)
        .bind(order.order_id)
        .bind(&order.user_id)
        .bind(OrderStatusType::New)
        .bind(order.uploaded_at)
        .bind(order.uploaded_at)
        .fetch_one(conn)
        .await;
    match result {
        Ok(order) => {
            debug!("🗃️ Order {} has been saved for {}", order.order_id, order.user_id);
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(LedgerStoreError::OrderAlreadyExists(order.order_id))
        },
        Err(e) => Err(e.into()),
    }
}

/// Fetches orders by number, regardless of who owns them. An empty `order_ids` slice returns every order.
pub async fn fetch_orders(order_ids: &[OrderId], conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerStoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));
    push_order_id_filter(&mut builder, order_ids);
    builder.push(" ORDER BY id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Fetches orders owned by `user_id`, oldest first. If `order_ids` is non-empty, the result is restricted to those
/// orders.
pub async fn fetch_orders_for_user(
    user_id: &UserId,
    order_ids: &[OrderId],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, LedgerStoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = "));
    builder.push_bind(user_id.clone());
    push_order_id_filter(&mut builder, order_ids);
    builder.push(" ORDER BY id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Fetches orders in any of the given statuses, in submission order. A `limit` of zero returns every match.
pub async fn fetch_orders_with_status(
    statuses: &[OrderStatusType],
    limit: usize,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, LedgerStoreError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));
    if !statuses.is_empty() {
        builder.push(" AND status IN (");
        let mut values = builder.separated(", ");
        for status in statuses {
            values.push_bind(*status);
        }
        values.push_unseparated(")");
    }
    builder.push(" ORDER BY id ASC");
    if limit > 0 {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Sets the status of a non-terminal order and returns the order's owner. This is not atomic on its own; run it inside
/// a transaction together with any ledger changes and pass `&mut *tx` as the connection.
pub async fn update_status(order: &Order, conn: &mut SqliteConnection) -> Result<UserId, LedgerStoreError> {
    let owner = sqlx::query_scalar::<_, UserId>(
        "UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ? AND status NOT IN ('INVALID', 'PROCESSED') \
         RETURNING user_id",
    )
    .bind(order.status)
    .bind(order.updated_at)
    .bind(order.order_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(owner) = owner {
        trace!("🗃️ Order {} is now {}", order.order_id, order.status);
        return Ok(owner);
    }
    let existing = fetch_orders(&[order.order_id], conn).await?;
    match existing.first() {
        Some(_) => Err(LedgerStoreError::OrderIsFinal(order.order_id)),
        None => Err(LedgerStoreError::OrderNotFound(order.order_id)),
    }
}

fn push_order_id_filter(builder: &mut QueryBuilder<'_, Sqlite>, order_ids: &[OrderId]) {
    if order_ids.is_empty() {
        return;
    }
    builder.push(" AND order_id IN (");
    let mut values = builder.separated(", ");
    for id in order_ids {
        values.push_bind(*id);
    }
    values.push_unseparated(")");
}
