//! # Backend contracts for the kitchen engine.
//!
//! This module defines the behaviour that database backends need to expose in order to be used by the kitchen
//! engine APIs. Each trait covers one area of the system, and carries its own error type:
//!
//! * [`CatalogManagement`] reads and curates the menu.
//! * [`CartManagement`] maintains guest and customer carts, including merging a guest cart on login.
//! * [`OrderManagement`] owns the order and payment aggregates. Checkout, status transitions and payment
//!   verification all go through here, and every state change is a single transaction.
//! * [`AccountManagement`] stores customer and admin accounts.
//! * [`SettingsManagement`] reads and writes the system-wide settings (ordering toggle, fees, advance percentage).
mod account_management;
mod cart_management;
mod catalog_management;
mod order_management;
mod settings_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use order_management::{OrderFlowError, OrderManagement};
pub use settings_management::{SettingsError, SettingsManagement};
