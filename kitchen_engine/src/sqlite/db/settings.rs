use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{SystemSettings, ORDERING_ENABLED};

pub async fn fetch_settings(conn: &mut SqliteConnection) -> Result<SystemSettings, sqlx::Error> {
    let pairs: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM system_settings").fetch_all(conn).await?;
    Ok(SystemSettings::from_pairs(pairs))
}

/// Upserts the given key/value rows. Values are not validated here.
pub async fn write_settings(
    pairs: Vec<(&'static str, String)>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for (key, value) in pairs {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *conn)
        .await?;
    }
    debug!("📝️ System settings saved");
    Ok(())
}

/// Flips the ordering flag in a single statement and returns the new value.
pub async fn toggle_ordering(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let value: Option<(String,)> = sqlx::query_as(
        r#"
        UPDATE system_settings
        SET value = CASE WHEN lower(value) IN ('true', '1', 'yes', 'on') THEN 'false' ELSE 'true' END,
            updated_at = CURRENT_TIMESTAMP
        WHERE key = $1
        RETURNING value
        "#,
    )
    .bind(ORDERING_ENABLED)
    .fetch_all(&mut *conn)
    .await?
    .pop();
    let enabled = match value {
        Some((v,)) => v == "true",
        None => {
            // Never written, so the default (enabled) applied. Toggling turns it off.
            sqlx::query("INSERT INTO system_settings (key, value) VALUES ($1, 'false')")
                .bind(ORDERING_ENABLED)
                .execute(&mut *conn)
                .await?;
            false
        },
    };
    Ok(enabled)
}
