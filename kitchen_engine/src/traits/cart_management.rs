use thiserror::Error;

use crate::{
    cart_objects::MergeSummary,
    db_types::{CartItem, CartLine, CartLineUpdate, CartOwner, NewCartLine},
};

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cart line #{0} does not exist in this cart")]
    LineNotFound(i64),
    #[error("Menu item #{0} does not exist")]
    MenuItemNotFound(i64),
    #[error("Menu item #{0} is not available at the moment")]
    MenuItemUnavailable(i64),
    #[error("Quantity must be between 1 and {max}, but {requested} was requested")]
    QuantityOutOfRange { requested: i64, max: i64 },
    #[error("Invalid cart request: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

/// Guest and customer cart storage.
///
/// Every call names the cart it operates on through a [`CartOwner`]. Lines belonging to a different owner are
/// invisible, so addressing someone else's line looks exactly like addressing a line that does not exist.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Fetches the lines of the cart, joined with the live menu data for each item.
    async fn fetch_cart(&self, owner: &CartOwner) -> Result<Vec<CartItem>, CartError>;

    /// Adds an item to the cart. If the cart already holds the item, the quantities are added together. The resulting
    /// quantity may not exceed `max_quantity`. Unavailable items cannot be added.
    async fn add_to_cart(&self, owner: &CartOwner, line: NewCartLine, max_quantity: i64)
        -> Result<CartLine, CartError>;

    /// Changes the quantity and/or note on a cart line. The quantity must lie in `1..=max_quantity`.
    async fn update_cart_line(
        &self,
        owner: &CartOwner,
        line_id: i64,
        update: CartLineUpdate,
        max_quantity: i64,
    ) -> Result<CartLine, CartError>;

    async fn remove_cart_line(&self, owner: &CartOwner, line_id: i64) -> Result<(), CartError>;

    /// Deletes every line in the cart, returning the number of lines removed.
    async fn clear_cart(&self, owner: &CartOwner) -> Result<u64, CartError>;

    /// Merges the guest cart identified by `session_id` into the cart of `user_id`, in a single transaction.
    ///
    /// * Lines for items the customer already has are added together, capped at `max_quantity`. Anything above the
    ///   cap is dropped. A guest note is copied over only if the customer's line has none.
    /// * Other lines are moved into the customer's cart, also capped at `max_quantity`.
    /// * The guest cart is empty afterwards.
    ///
    /// Calling this with an empty guest cart is a no-op. Calling it twice with the same non-empty guest cart is not
    /// possible, since the first call empties it.
    async fn merge_guest_cart(
        &self,
        session_id: &str,
        user_id: i64,
        max_quantity: i64,
    ) -> Result<MergeSummary, CartError>;
}
