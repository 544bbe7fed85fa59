use std::fmt::Debug;

use log::*;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    cart_objects::CartContents,
    db_types::{CartLineUpdate, CartOwner, NewCartLine},
    traits::{CartError, CartManagement, SettingsManagement},
};

const GUEST_SESSION_LENGTH: usize = 32;

/// `CartApi` manages guest and customer carts.
///
/// Carts are addressed explicitly through a [`CartOwner`]; there is no notion of a "current" cart.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Generates a fresh guest cart session id.
    pub fn new_guest_session() -> String {
        rand::thread_rng().sample_iter(&Alphanumeric).take(GUEST_SESSION_LENGTH).map(char::from).collect()
    }

    /// Guest session ids are opaque, but must look like something [`Self::new_guest_session`] could have produced.
    pub fn is_valid_guest_session(session_id: &str) -> bool {
        (8..=64).contains(&session_id.len()) && session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    }
}

impl<B> CartApi<B>
where B: CartManagement + SettingsManagement
{
    pub async fn cart(&self, owner: &CartOwner) -> Result<CartContents, CartError> {
        let items = self.db.fetch_cart(owner).await?;
        Ok(CartContents::from(items))
    }

    pub async fn add_item(&self, owner: &CartOwner, line: NewCartLine) -> Result<CartContents, CartError> {
        let max = self.db.fetch_settings().await?.max_quantity_per_item;
        if line.quantity < 1 || line.quantity > max {
            return Err(CartError::QuantityOutOfRange { requested: line.quantity, max });
        }
        let line = NewCartLine { notes: clean_note(line.notes), ..line };
        let saved = self.db.add_to_cart(owner, line, max).await?;
        debug!("🛒️ Cart line #{} for {owner} now holds {} of item #{}", saved.id, saved.quantity, saved.menu_item_id);
        self.cart(owner).await
    }

    pub async fn update_line(
        &self,
        owner: &CartOwner,
        line_id: i64,
        update: CartLineUpdate,
    ) -> Result<CartContents, CartError> {
        let max = self.db.fetch_settings().await?.max_quantity_per_item;
        if let Some(quantity) = update.quantity {
            if quantity < 1 || quantity > max {
                return Err(CartError::QuantityOutOfRange { requested: quantity, max });
            }
        }
        let update = CartLineUpdate { notes: update.notes.map(|n| n.trim().to_string()), ..update };
        self.db.update_cart_line(owner, line_id, update, max).await?;
        self.cart(owner).await
    }

    pub async fn remove_line(&self, owner: &CartOwner, line_id: i64) -> Result<CartContents, CartError> {
        self.db.remove_cart_line(owner, line_id).await?;
        debug!("🛒️ Cart line #{line_id} removed from the cart of {owner}");
        self.cart(owner).await
    }

    pub async fn clear(&self, owner: &CartOwner) -> Result<CartContents, CartError> {
        let n = self.db.clear_cart(owner).await?;
        debug!("🛒️ Cleared {n} lines from the cart of {owner}");
        Ok(CartContents::default())
    }

    /// Merges the guest cart into the customer's cart and returns the merged cart. The caller must only do this once
    /// per login.
    pub async fn merge_guest_cart(&self, session_id: &str, user_id: i64) -> Result<CartContents, CartError> {
        let max = self.db.fetch_settings().await?.max_quantity_per_item;
        let summary = self.db.merge_guest_cart(session_id, user_id, max).await?;
        info!(
            "🛒️ Merged guest session {session_id} into the cart of user #{user_id}. {} lines combined, {} moved, {} \
             units dropped",
            summary.combined, summary.moved, summary.dropped_units
        );
        self.cart(&CartOwner::User(user_id)).await
    }
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
