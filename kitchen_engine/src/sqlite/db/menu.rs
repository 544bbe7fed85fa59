use std::collections::HashMap;

use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{MenuItem, MenuItemUpdate, NewMenuItem},
    traits::CatalogError,
};

/// Fetches the menu, sorted by category and English name. Items without a category come last.
pub async fn fetch_menu(available_only: bool, conn: &mut SqliteConnection) -> Result<Vec<MenuItem>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM menu_items ");
    if available_only {
        builder.push("WHERE is_available = 1 ");
    }
    builder.push("ORDER BY category IS NULL, category, name_en, id");
    let mut items = builder.build_query_as::<MenuItem>().fetch_all(&mut *conn).await?;
    attach_images(&mut items, conn).await?;
    trace!("📝️ Fetched {} menu items", items.len());
    Ok(items)
}

pub async fn fetch_menu_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<MenuItem>, sqlx::Error> {
    let item: Option<MenuItem> =
        sqlx::query_as("SELECT * FROM menu_items WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match item {
        Some(mut item) => {
            item.image_urls = fetch_images(&[id], conn).await?.remove(&id).unwrap_or_default();
            Ok(Some(item))
        },
        None => Ok(None),
    }
}

/// The image URLs of the given menu items, keyed by menu item id, in the order they were added.
pub async fn fetch_images(
    ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<String>>, sqlx::Error> {
    let mut images = HashMap::<i64, Vec<String>>::new();
    if ids.is_empty() {
        return Ok(images);
    }
    let mut builder = QueryBuilder::new("SELECT menu_item_id, url FROM menu_item_images WHERE menu_item_id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(") ORDER BY id");
    let rows = builder.build_query_as::<(i64, String)>().fetch_all(conn).await?;
    for (id, url) in rows {
        images.entry(id).or_default().push(url);
    }
    Ok(images)
}

async fn attach_images(items: &mut [MenuItem], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let ids = items.iter().map(|i| i.id).collect::<Vec<_>>();
    let mut images = fetch_images(&ids, conn).await?;
    for item in items {
        item.image_urls = images.remove(&item.id).unwrap_or_default();
    }
    Ok(())
}

/// Fetches the menu items with the given ids, without their images. Ids that do not exist are silently left out.
pub async fn fetch_menu_items(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<MenuItem>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::new("SELECT * FROM menu_items WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");
    let items = builder.build_query_as::<MenuItem>().fetch_all(conn).await?;
    Ok(items)
}

/// Inserts the menu item and its images. Run this inside a transaction.
pub async fn insert_menu_item(item: NewMenuItem, conn: &mut SqliteConnection) -> Result<MenuItem, sqlx::Error> {
    let image_urls = item.image_urls;
    let mut inserted: MenuItem = sqlx::query_as(
        r#"
            INSERT INTO menu_items (
                name_en,
                name_ar,
                description_en,
                description_ar,
                category,
                price,
                is_available
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(item.name_en)
    .bind(item.name_ar)
    .bind(item.description_en)
    .bind(item.description_ar)
    .bind(item.category)
    .bind(item.price.value())
    .bind(item.is_available)
    .fetch_all(&mut *conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    for url in image_urls {
        insert_image(inserted.id, url.trim(), &mut *conn).await?;
    }
    inserted.image_urls = fetch_images(&[inserted.id], conn).await?.remove(&inserted.id).unwrap_or_default();
    debug!("📝️ Menu item #{} inserted", inserted.id);
    Ok(inserted)
}

async fn insert_image(menu_item_id: i64, url: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO menu_item_images (menu_item_id, url) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(menu_item_id)
        .bind(url)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Bumps `updated_at`. Returns false if the item does not exist.
async fn touch_menu_item(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE menu_items SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Appends an image URL to the menu item. Adding a URL that is already there changes nothing. Run this inside a
/// transaction.
pub async fn add_image(id: i64, url: &str, conn: &mut SqliteConnection) -> Result<MenuItem, CatalogError> {
    if !touch_menu_item(id, &mut *conn).await? {
        return Err(CatalogError::MenuItemNotFound(id));
    }
    if insert_image(id, url, &mut *conn).await? {
        debug!("📝️ Image added to menu item #{id}");
    }
    fetch_menu_item(id, conn).await?.ok_or(CatalogError::MenuItemNotFound(id))
}

/// Removes an image URL from the menu item. Run this inside a transaction.
pub async fn remove_image(id: i64, url: &str, conn: &mut SqliteConnection) -> Result<MenuItem, CatalogError> {
    if !touch_menu_item(id, &mut *conn).await? {
        return Err(CatalogError::MenuItemNotFound(id));
    }
    let result = sqlx::query("DELETE FROM menu_item_images WHERE menu_item_id = $1 AND url = $2")
        .bind(id)
        .bind(url)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::ImageNotFound { id, url: url.to_string() });
    }
    debug!("📝️ Image removed from menu item #{id}");
    fetch_menu_item(id, conn).await?.ok_or(CatalogError::MenuItemNotFound(id))
}

pub async fn update_menu_item(
    id: i64,
    update: MenuItemUpdate,
    conn: &mut SqliteConnection,
) -> Result<MenuItem, CatalogError> {
    if update.is_empty() {
        debug!("📝️ No fields to update for menu item #{id}. Update request skipped.");
        return Err(CatalogError::NoOpUpdate(id));
    }
    let mut builder = QueryBuilder::new("UPDATE menu_items SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name_en) = update.name_en {
        set_clause.push("name_en = ");
        set_clause.push_bind_unseparated(name_en);
    }
    if let Some(name_ar) = update.name_ar {
        set_clause.push("name_ar = ");
        set_clause.push_bind_unseparated(name_ar);
    }
    if let Some(description_en) = update.description_en {
        set_clause.push("description_en = ");
        set_clause.push_bind_unseparated(description_en);
    }
    if let Some(description_ar) = update.description_ar {
        set_clause.push("description_ar = ");
        set_clause.push_bind_unseparated(description_ar);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ");
        set_clause.push_bind_unseparated(category);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price.value());
    }
    if let Some(is_available) = update.is_available {
        set_clause.push("is_available = ");
        set_clause.push_bind_unseparated(is_available);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let updated = builder.build_query_as::<MenuItem>().fetch_all(&mut *conn).await?.pop();
    let mut item = updated.ok_or(CatalogError::MenuItemNotFound(id))?;
    item.image_urls = fetch_images(&[id], conn).await?.remove(&id).unwrap_or_default();
    Ok(item)
}

/// Deletes the menu item and every cart line that references it. Order lines are snapshots and are not affected.
pub async fn delete_menu_item(id: i64, conn: &mut SqliteConnection) -> Result<(), CatalogError> {
    let lines = sqlx::query("DELETE FROM cart_lines WHERE menu_item_id = $1").bind(id).execute(&mut *conn).await?;
    let result = sqlx::query("DELETE FROM menu_items WHERE id = $1").bind(id).execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::MenuItemNotFound(id));
    }
    debug!("📝️ Menu item #{id} deleted, along with {} cart lines", lines.rows_affected());
    Ok(())
}

pub async fn toggle_menu_item(id: i64, conn: &mut SqliteConnection) -> Result<MenuItem, CatalogError> {
    let mut item: MenuItem = sqlx::query_as(
        r#"
        UPDATE menu_items SET is_available = NOT is_available, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .pop()
    .ok_or(CatalogError::MenuItemNotFound(id))?;
    item.image_urls = fetch_images(&[id], conn).await?.remove(&id).unwrap_or_default();
    Ok(item)
}
