use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, Payment, PaymentMethod, PaymentStatus},
    order_objects::PaymentQueryFilter,
};

pub async fn insert_payment(
    order_id: i64,
    method: PaymentMethod,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, method, amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(method.to_string())
    .bind(amount.value())
    .bind(PaymentStatus::Pending.to_string())
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("📝️ Payment #{} of {amount} via {method} inserted for order #{order_id}", payment.id);
    Ok(payment)
}

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Fetches payments according to the `PaymentQueryFilter`, least recently updated first. That puts the proof that has
/// been waiting longest at the top of the review queue.
pub async fn search_payments(
    query: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM payments ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
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
    if let Some(method) = query.method {
        where_clause.push("method = ");
        where_clause.push_bind_unseparated(method.to_string());
    }
    builder.push(" ORDER BY updated_at ASC, id ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let payments = builder.build_query_as::<Payment>().fetch_all(conn).await?;
    Ok(payments)
}

/// Records the proof and moves the payment to `ProofUploaded`, provided the payment is still in a state that accepts a
/// proof. Returns `None` otherwise.
pub async fn attach_proof(
    id: i64,
    proof_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = 'ProofUploaded', proof_ref = $1, rejection_reason = NULL, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND status IN ('Pending', 'ProofUploaded', 'Rejected')
        RETURNING *
        "#,
    )
    .bind(proof_ref)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(payment)
}

/// Moves a payment from `ProofUploaded` to `Confirmed`. Returns `None` if the payment is in any other state.
pub async fn confirm(
    id: i64,
    reviewer_id: i64,
    transaction_ref: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = 'Confirmed',
            transaction_ref = COALESCE($1, transaction_ref),
            reviewed_by = $2,
            reviewed_at = CURRENT_TIMESTAMP,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = 'ProofUploaded'
        RETURNING *
        "#,
    )
    .bind(transaction_ref)
    .bind(reviewer_id)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(payment)
}

/// Moves a payment from `ProofUploaded` to `Rejected`. Returns `None` if the payment is in any other state.
pub async fn reject(
    id: i64,
    reviewer_id: i64,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = 'Rejected',
            rejection_reason = $1,
            reviewed_by = $2,
            reviewed_at = CURRENT_TIMESTAMP,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND status = 'ProofUploaded'
        RETURNING *
        "#,
    )
    .bind(reason)
    .bind(reviewer_id)
    .bind(id)
    .fetch_all(conn)
    .await?
    .pop();
    Ok(payment)
}
