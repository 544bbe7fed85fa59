use thiserror::Error;

use crate::db_types::{SettingsUpdate, SystemSettings};

#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl From<sqlx::Error> for SettingsError {
    fn from(e: sqlx::Error) -> Self {
        SettingsError::DatabaseError(e.to_string())
    }
}

/// Access to the system-wide settings store.
#[allow(async_fn_in_trait)]
pub trait SettingsManagement {
    /// Fetches the current settings. Keys that have never been written take their default values.
    async fn fetch_settings(&self) -> Result<SystemSettings, SettingsError>;

    /// Applies and persists the given update, returning the resulting settings. The combined result is validated
    /// before anything is written.
    async fn update_settings(&self, update: SettingsUpdate) -> Result<SystemSettings, SettingsError>;

    /// Flips the `ordering_enabled` flag, returning the new value.
    async fn toggle_ordering(&self) -> Result<bool, SettingsError>;
}
