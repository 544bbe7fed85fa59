use serde::{Deserialize, Serialize};

use crate::db_types::{CartItem, Money};

/// A cart as it is shown to the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartContents {
    pub items: Vec<CartItem>,
    pub subtotal: Money,
    pub total_items: i64,
}

impl From<Vec<CartItem>> for CartContents {
    fn from(items: Vec<CartItem>) -> Self {
        let subtotal = items.iter().map(CartItem::line_total).sum();
        let total_items = items.iter().map(|i| i.quantity).sum();
        Self { items, subtotal, total_items }
    }
}

impl CartContents {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, menu_item_id: i64) -> i64 {
        self.items.iter().filter(|i| i.menu_item_id == menu_item_id).map(|i| i.quantity).sum()
    }
}

/// What happened to a guest cart when it was merged into a customer's cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Guest lines that were added to an existing line in the customer's cart.
    pub combined: usize,
    /// Guest lines that were moved over as-is.
    pub moved: usize,
    /// Units that were dropped because they would have taken a line above the per-item maximum.
    pub dropped_units: i64,
}

/// The outcome of copying a past order back into the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderSummary {
    /// Menu item ids that were added to the cart.
    pub added: Vec<i64>,
    /// Menu item ids that could not be added, because they are gone, switched off, or already at the maximum.
    pub skipped: Vec<i64>,
}
