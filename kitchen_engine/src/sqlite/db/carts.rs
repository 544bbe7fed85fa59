use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    cart_objects::MergeSummary,
    db_types::{CartItem, CartLine, CartLineUpdate, CartOwner, NewCartLine},
    sqlite::db::menu,
    traits::CartError,
};

fn push_owner<'a>(builder: &mut QueryBuilder<'a, Sqlite>, owner: &'a CartOwner) {
    match owner {
        CartOwner::User(id) => {
            builder.push("cart_lines.user_id = ");
            builder.push_bind(*id);
        },
        CartOwner::Guest(session_id) => {
            builder.push("cart_lines.session_id = ");
            builder.push_bind(session_id.as_str());
        },
    }
}

fn owner_columns(owner: &CartOwner) -> (Option<i64>, Option<String>) {
    match owner {
        CartOwner::User(id) => (Some(*id), None),
        CartOwner::Guest(session_id) => (None, Some(session_id.clone())),
    }
}

/// The cart lines for `owner`, joined with the live menu data, in the order they were added.
pub async fn fetch_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT
        cart_lines.id AS line_id,
        cart_lines.menu_item_id,
        menu_items.name_en,
        menu_items.name_ar,
        menu_items.price AS unit_price,
        cart_lines.quantity,
        cart_lines.notes,
        menu_items.is_available
    FROM cart_lines JOIN menu_items ON menu_items.id = cart_lines.menu_item_id
    WHERE "#,
    );
    push_owner(&mut builder, owner);
    builder.push(" ORDER BY cart_lines.id");
    let items = builder.build_query_as::<CartItem>().fetch_all(conn).await?;
    trace!("📝️ Fetched {} cart lines for {owner}", items.len());
    Ok(items)
}

pub async fn fetch_line_for_item(
    owner: &CartOwner,
    menu_item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartLine>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM cart_lines WHERE ");
    push_owner(&mut builder, owner);
    builder.push(" AND menu_item_id = ");
    builder.push_bind(menu_item_id);
    let line = builder.build_query_as::<CartLine>().fetch_optional(conn).await?;
    Ok(line)
}

/// Adds `line` to the cart, adding to the quantity of an existing line for the same item. Run this inside a
/// transaction.
///
/// The first statement is the capped update, so the transaction holds the write lock from the start.
pub async fn add_to_cart(
    owner: &CartOwner,
    line: NewCartLine,
    max_quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartLine, CartError> {
    if line.quantity < 1 || line.quantity > max_quantity {
        return Err(CartError::QuantityOutOfRange { requested: line.quantity, max: max_quantity });
    }
    let mut builder = QueryBuilder::new("UPDATE cart_lines SET quantity = quantity + ");
    builder.push_bind(line.quantity);
    builder.push(", notes = COALESCE(");
    builder.push_bind(line.notes.clone());
    builder.push(", notes), updated_at = CURRENT_TIMESTAMP WHERE ");
    push_owner(&mut builder, owner);
    builder.push(" AND menu_item_id = ");
    builder.push_bind(line.menu_item_id);
    builder.push(" AND quantity + ");
    builder.push_bind(line.quantity);
    builder.push(" <= ");
    builder.push_bind(max_quantity);
    builder.push(
        " AND EXISTS (SELECT 1 FROM menu_items WHERE menu_items.id = cart_lines.menu_item_id AND is_available = 1)",
    );
    builder.push(" RETURNING *");
    if let Some(updated) = builder.build_query_as::<CartLine>().fetch_all(&mut *conn).await?.pop() {
        debug!("📝️ Cart line #{} for {owner} increased to {}", updated.id, updated.quantity);
        return Ok(updated);
    }
    // Nothing was updated. Work out why.
    let item = menu::fetch_menu_item(line.menu_item_id, &mut *conn)
        .await?
        .ok_or(CartError::MenuItemNotFound(line.menu_item_id))?;
    if !item.is_available {
        return Err(CartError::MenuItemUnavailable(item.id));
    }
    if let Some(existing) = fetch_line_for_item(owner, line.menu_item_id, &mut *conn).await? {
        return Err(CartError::QuantityOutOfRange { requested: existing.quantity + line.quantity, max: max_quantity });
    }
    let inserted = insert_line(owner, line.menu_item_id, line.quantity, line.notes, conn).await?;
    debug!("📝️ Cart line #{} added for {owner}", inserted.id);
    Ok(inserted)
}

async fn insert_line(
    owner: &CartOwner,
    menu_item_id: i64,
    quantity: i64,
    notes: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<CartLine, sqlx::Error> {
    let (user_id, session_id) = owner_columns(owner);
    let line = sqlx::query_as(
        r#"
            INSERT INTO cart_lines (user_id, session_id, menu_item_id, quantity, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(session_id)
    .bind(menu_item_id)
    .bind(quantity)
    .bind(notes)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(line)
}

pub async fn update_cart_line(
    owner: &CartOwner,
    line_id: i64,
    update: CartLineUpdate,
    max_quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartLine, CartError> {
    if let Some(quantity) = update.quantity {
        if quantity < 1 || quantity > max_quantity {
            return Err(CartError::QuantityOutOfRange { requested: quantity, max: max_quantity });
        }
    }
    let mut builder = QueryBuilder::new("UPDATE cart_lines SET updated_at = CURRENT_TIMESTAMP");
    if let Some(quantity) = update.quantity {
        builder.push(", quantity = ");
        builder.push_bind(quantity);
    }
    if let Some(notes) = update.notes {
        builder.push(", notes = ");
        builder.push_bind(Some(notes).filter(|n| !n.trim().is_empty()));
    }
    builder.push(" WHERE id = ");
    builder.push_bind(line_id);
    builder.push(" AND ");
    push_owner(&mut builder, owner);
    builder.push(" RETURNING *");
    let line = builder.build_query_as::<CartLine>().fetch_all(conn).await?.pop();
    line.ok_or(CartError::LineNotFound(line_id))
}

pub async fn remove_cart_line(owner: &CartOwner, line_id: i64, conn: &mut SqliteConnection) -> Result<(), CartError> {
    let mut builder = QueryBuilder::new("DELETE FROM cart_lines WHERE id = ");
    builder.push_bind(line_id);
    builder.push(" AND ");
    push_owner(&mut builder, owner);
    let result = builder.build().execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(CartError::LineNotFound(line_id));
    }
    Ok(())
}

/// Removes every line from the cart and returns them.
pub async fn take_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let mut builder = QueryBuilder::new("DELETE FROM cart_lines WHERE ");
    push_owner(&mut builder, owner);
    builder.push(" RETURNING *");
    let mut lines = builder.build_query_as::<CartLine>().fetch_all(conn).await?;
    lines.sort_by_key(|l| l.id);
    Ok(lines)
}

pub async fn clear_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let mut builder = QueryBuilder::new("DELETE FROM cart_lines WHERE ");
    push_owner(&mut builder, owner);
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

/// Moves the guest cart into the customer's cart. Run this inside a transaction.
///
/// The guest lines are deleted first, which also takes the write lock for the rest of the merge.
pub async fn merge_guest_cart(
    session_id: &str,
    user_id: i64,
    max_quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<MergeSummary, CartError> {
    let guest = CartOwner::Guest(session_id.to_string());
    let user = CartOwner::User(user_id);
    let guest_lines = take_cart(&guest, &mut *conn).await?;
    let mut summary = MergeSummary::default();
    for line in guest_lines {
        match fetch_line_for_item(&user, line.menu_item_id, &mut *conn).await? {
            Some(existing) => {
                let wanted = existing.quantity + line.quantity;
                let quantity = wanted.min(max_quantity).max(existing.quantity);
                summary.dropped_units += wanted - quantity;
                sqlx::query(
                    r#"
                    UPDATE cart_lines
                    SET quantity = $1, notes = COALESCE(notes, $2), updated_at = CURRENT_TIMESTAMP
                    WHERE id = $3
                    "#,
                )
                .bind(quantity)
                .bind(line.notes)
                .bind(existing.id)
                .execute(&mut *conn)
                .await?;
                summary.combined += 1;
            },
            None => {
                let quantity = line.quantity.min(max_quantity);
                summary.dropped_units += line.quantity - quantity;
                insert_line(&user, line.menu_item_id, quantity, line.notes, &mut *conn).await?;
                summary.moved += 1;
            },
        }
    }
    debug!(
        "📝️ Guest session {session_id} merged into the cart of user #{user_id}: {} combined, {} moved, {} units \
         dropped",
        summary.combined, summary.moved, summary.dropped_units
    );
    Ok(summary)
}
