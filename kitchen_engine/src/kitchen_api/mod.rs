//! # Kitchen engine public API
//!
//! The `kitchen_api` module exposes the programmatic API for the kitchen back end. The API is modular, so that clients
//! can pick the parts they need:
//!
//! * [`accounts_api`] registers customers and checks their credentials.
//! * [`catalog_api`] serves the menu and lets admins curate it.
//! * [`cart_api`] manages guest and customer carts, and merges a guest cart into a customer's cart on login.
//! * [`order_flow_api`] is the primary API for checkout, the order lifecycle and payment verification.
//! * [`settings_api`] reads and updates the system-wide settings.
//!
//! The other submodules hold the request and response types used by these APIs.
//!
//! # API usage
//!
//! Every API is created by handing it a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use kitchen_engine::{order_objects::Actor, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/kitchen.db", 5).await?;
//! // SqliteDatabase implements OrderManagement and SettingsManagement
//! let api = OrderFlowApi::new(db);
//! let orders = api.my_orders(&Actor::customer(42)).await?;
//! ```

pub mod account_objects;
pub mod accounts_api;
pub mod cart_api;
pub mod cart_objects;
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod settings_api;
