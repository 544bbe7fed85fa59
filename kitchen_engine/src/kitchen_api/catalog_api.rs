use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MenuItem, MenuItemUpdate, NewMenuItem},
    traits::{CatalogError, CatalogManagement},
};

/// `CatalogApi` serves the menu to customers and lets admins curate it.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn menu(&self) -> Result<Vec<MenuItem>, CatalogError> {
        self.db.fetch_menu(false).await
    }

    pub async fn available_menu(&self) -> Result<Vec<MenuItem>, CatalogError> {
        self.db.fetch_menu(true).await
    }

    pub async fn menu_item(&self, id: i64) -> Result<MenuItem, CatalogError> {
        self.db.fetch_menu_item(id).await?.ok_or(CatalogError::MenuItemNotFound(id))
    }

    pub async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError> {
        item.validate().map_err(CatalogError::Validation)?;
        let item = self.db.insert_menu_item(item).await?;
        info!("🍽️ Menu item #{} ({}) added at {}", item.id, item.name_en, item.price);
        Ok(item)
    }

    pub async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::NoOpUpdate(id));
        }
        update.validate().map_err(CatalogError::Validation)?;
        let item = self.db.update_menu_item(id, update).await?;
        debug!("🍽️ Menu item #{id} updated");
        Ok(item)
    }

    pub async fn remove_menu_item(&self, id: i64) -> Result<(), CatalogError> {
        self.db.delete_menu_item(id).await?;
        info!("🍽️ Menu item #{id} removed");
        Ok(())
    }

    pub async fn toggle_availability(&self, id: i64) -> Result<MenuItem, CatalogError> {
        let item = self.db.toggle_menu_item(id).await?;
        info!("🍽️ Menu item #{id} is now {}", if item.is_available { "available" } else { "unavailable" });
        Ok(item)
    }

    pub async fn add_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError> {
        let url = image_url(url)?;
        let item = self.db.add_menu_image(id, url).await?;
        debug!("🍽️ Menu item #{id} now has {} images", item.image_urls.len());
        Ok(item)
    }

    pub async fn remove_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError> {
        let url = image_url(url)?;
        let item = self.db.remove_menu_image(id, url).await?;
        debug!("🍽️ Menu item #{id} now has {} images", item.image_urls.len());
        Ok(item)
    }
}

fn image_url(url: &str) -> Result<&str, CatalogError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CatalogError::Validation("An image URL is required".into()));
    }
    Ok(url)
}
