use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CustomerSummary, NewUser, User},
    traits::AccountApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    let email = user.email.clone();
    let phone = user.phone.clone();
    let result: Result<User, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO users (name, email, phone, password_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.phone)
    .bind(user.password_hash)
    .bind(user.is_admin)
    .fetch_all(conn)
    .await
    .and_then(|mut rows| rows.pop().ok_or(sqlx::Error::RowNotFound));
    match result {
        Ok(user) => {
            debug!("📝️ User #{} inserted", user.id);
            Ok(user)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            if e.message().contains("users.phone") {
                Err(AccountApiError::PhoneAlreadyRegistered(phone.unwrap_or_default()))
            } else {
                Err(AccountApiError::EmailAlreadyRegistered(email))
            }
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

/// Customers with their order statistics. Only delivered orders count towards `total_spent`.
pub async fn fetch_customers(conn: &mut SqliteConnection) -> Result<Vec<CustomerSummary>, sqlx::Error> {
    let customers = sqlx::query_as(
        r#"
            SELECT users.*,
                COUNT(orders.id) AS order_count,
                COALESCE(SUM(CASE WHEN orders.status = 'Delivered' THEN orders.total ELSE 0 END), 0) AS total_spent
            FROM users LEFT JOIN orders ON orders.user_id = users.id
            WHERE users.is_admin = 0
            GROUP BY users.id
            ORDER BY users.created_at DESC, users.id DESC;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(customers)
}
