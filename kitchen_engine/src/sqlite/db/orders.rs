use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{CartItem, Order, OrderLine, OrderStatusType},
    order_objects::{CheckoutParams, OrderQueryFilter, OrderTotals},
};

/// Inserts a new order with status `New`. This is not atomic on its own; call it inside the checkout transaction.
pub async fn insert_order(
    user_id: i64,
    totals: &OrderTotals,
    checkout: &CheckoutParams,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                subtotal,
                delivery_fee,
                total,
                advance_amount,
                delivery_address,
                notes,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(totals.subtotal.value())
    .bind(totals.delivery_fee.value())
    .bind(totals.total.value())
    .bind(totals.advance_amount.value())
    .bind(checkout.delivery_address.as_str())
    .bind(checkout.notes.as_deref())
    .bind(OrderStatusType::New.to_string())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("📝️ Order #{} inserted for user #{user_id}", order.id);
    Ok(order)
}

/// Stores a snapshot of a cart line against the order. The name and price are copied, not referenced.
pub async fn insert_order_line(
    order_id: i64,
    item: &CartItem,
    conn: &mut SqliteConnection,
) -> Result<OrderLine, sqlx::Error> {
    let line: OrderLine = sqlx::query_as(
        r#"
            INSERT INTO order_lines (order_id, menu_item_id, name_en, name_ar, unit_price, quantity, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.menu_item_id)
    .bind(item.name_en.as_str())
    .bind(item.name_ar.as_str())
    .bind(item.unit_price.value())
    .bind(item.quantity)
    .bind(item.notes.as_deref())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(line)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// All orders for the user, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in descending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Moves the order from `from` to `to`, but only if it is still in `from`. Returns `None` if the order does not exist
/// or has already moved on.
pub async fn update_order_status(
    id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to.to_string())
    .bind(id)
    .bind(from.to_string())
    .fetch_all(conn)
    .await?
    .pop();
    Ok(order)
}

pub async fn update_admin_notes(
    id: i64,
    notes: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("UPDATE orders SET admin_notes = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(notes)
            .bind(id)
            .fetch_all(conn)
            .await?
            .pop();
    Ok(order)
}
