use thiserror::Error;

use crate::db_types::{MenuItem, MenuItemUpdate, NewMenuItem};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Menu item #{0} does not exist")]
    MenuItemNotFound(i64),
    #[error("Invalid menu item: {0}")]
    Validation(String),
    #[error("The update request for menu item #{0} does not change anything")]
    NoOpUpdate(i64),
    #[error("Menu item #{id} has no image {url}")]
    ImageNotFound { id: i64, url: String },
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Read and write access to the menu.
///
/// Menu items are reference data. Orders copy what they need from them at checkout, so editing or deleting an item
/// never affects an order that has already been placed.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches the menu, sorted by category and English name. If `available_only` is true, items that are switched
    /// off are left out.
    async fn fetch_menu(&self, available_only: bool) -> Result<Vec<MenuItem>, CatalogError>;

    async fn fetch_menu_item(&self, id: i64) -> Result<Option<MenuItem>, CatalogError>;

    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError>;

    async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, CatalogError>;

    /// Removes a menu item. Any cart lines that reference it are removed with it.
    async fn delete_menu_item(&self, id: i64) -> Result<(), CatalogError>;

    /// Flips the availability flag of the item and returns the updated record.
    async fn toggle_menu_item(&self, id: i64) -> Result<MenuItem, CatalogError>;

    /// Appends an image URL to the item. Adding a URL the item already has is not an error.
    async fn add_menu_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError>;

    /// Removes an image URL from the item, failing with [`CatalogError::ImageNotFound`] if it is not there.
    async fn remove_menu_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError>;
}
