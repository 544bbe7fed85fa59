use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{SettingsUpdate, SystemSettings},
    traits::{SettingsError, SettingsManagement},
};

pub struct SettingsApi<B> {
    db: B,
}

impl<B> Debug for SettingsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettingsApi")
    }
}

impl<B> SettingsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> SettingsApi<B>
where B: SettingsManagement
{
    pub async fn settings(&self) -> Result<SystemSettings, SettingsError> {
        self.db.fetch_settings().await
    }

    pub async fn ordering_enabled(&self) -> Result<bool, SettingsError> {
        Ok(self.db.fetch_settings().await?.ordering_enabled)
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<SystemSettings, SettingsError> {
        if update.is_empty() {
            return self.db.fetch_settings().await;
        }
        let settings = self.db.update_settings(update).await?;
        info!("⚙️ System settings updated: {settings:?}");
        Ok(settings)
    }

    pub async fn toggle_ordering(&self) -> Result<bool, SettingsError> {
        let enabled = self.db.toggle_ordering().await?;
        info!("⚙️ Ordering is now {}", if enabled { "enabled" } else { "disabled" });
        Ok(enabled)
    }
}
