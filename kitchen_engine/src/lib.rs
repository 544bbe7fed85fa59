//! Kitchen Engine
//!
//! The kitchen engine holds the business rules of a cloud-kitchen ordering back end: the menu, guest and customer
//! carts, checkout, the order lifecycle and the verification of manual payments (bank transfers and mobile wallets,
//! confirmed by an admin from an uploaded proof). It knows nothing about HTTP.
//!
//! The library is divided into these sections:
//! 1. The data types stored in the database ([`mod@db_types`]), including the order and payment state machines.
//! 2. The backend contracts ([`mod@traits`]). A database backend implements these traits to be usable by the APIs. An
//!    SQLite backend ([`SqliteDatabase`]) is provided.
//! 3. The public API ([`OrderFlowApi`], [`CartApi`], [`CatalogApi`], [`AccountApi`] and [`SettingsApi`]). These
//!    enforce who may do what, and delegate the atomic state changes to the backend.
//! 4. Storage for proof-of-payment uploads ([`mod@proof_storage`]).
pub mod db_types;
pub mod proof_storage;
pub mod traits;

mod kitchen_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use kitchen_api::{
    account_objects,
    accounts_api::AccountApi,
    cart_api::CartApi,
    cart_objects,
    catalog_api::CatalogApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    settings_api::SettingsApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    CartError,
    CartManagement,
    CatalogError,
    CatalogManagement,
    OrderFlowError,
    OrderManagement,
    SettingsError,
    SettingsManagement,
};
