//! A complete kitchen backed by a throwaway SQLite file, for the integration tests.
#![allow(dead_code)]

use kitchen_engine::{
    account_objects::Registration,
    db_types::{CartOwner, MenuItem, Money, NewCartLine, NewMenuItem, User},
    order_objects::{Actor, NewOrderRequest, OrderWithPayment},
    proof_storage::{LocalProofStorage, ProofUpload},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SettingsApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tempfile::TempDir;

pub const PASSWORD: &str = "password123";

#[derive(Debug)]
pub struct KitchenSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub carts: CartApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
    pub settings: SettingsApi<SqliteDatabase>,
    pub storage: LocalProofStorage,
    proof_dir: TempDir,
}

impl KitchenSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {url}");
        let proof_dir = tempfile::tempdir().expect("Error creating proof directory");
        let storage = LocalProofStorage::new(proof_dir.path(), 1024 * 1024).expect("Error creating proof storage");
        Self {
            db_path: url,
            orders: OrderFlowApi::new(db.clone()),
            carts: CartApi::new(db.clone()),
            catalog: CatalogApi::new(db.clone()),
            accounts: AccountApi::new(db.clone()),
            settings: SettingsApi::new(db.clone()),
            db,
            storage,
            proof_dir,
        }
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.db_path).await {
            error!("🚀️ Failed to drop database {}: {e}", self.db_path);
        }
    }

    pub async fn customer(&self, name: &str) -> User {
        let email = format!("{}@example.com", name.to_lowercase());
        self.accounts.register(Registration::new(name, email.as_str(), PASSWORD)).await.expect("Error registering")
    }

    pub async fn admin(&self, name: &str) -> User {
        let email = format!("{}@kitchen.example.com", name.to_lowercase());
        self.accounts.ensure_admin(name, &email, PASSWORD).await.expect("Error creating admin")
    }

    pub async fn menu_item(&self, name: &str, price: i64) -> MenuItem {
        let item = NewMenuItem::new(name.to_string(), format!("{name} (ar)"), Money::from(price));
        self.catalog.add_menu_item(item).await.expect("Error adding menu item")
    }

    pub async fn add_to_cart(&self, user: &User, item: &MenuItem, quantity: i64) {
        let owner = CartOwner::User(user.id);
        self.carts.add_item(&owner, NewCartLine::new(item.id, quantity)).await.expect("Error adding to cart");
    }

    /// Places an order for the user's current cart, paying the advance by InstaPay.
    pub async fn place_order(&self, user: &User) -> OrderWithPayment {
        let request = NewOrderRequest::new("12 Tahrir St, Cairo", kitchen_engine::db_types::PaymentMethod::Instapay);
        self.orders.place_order(&Actor::customer(user.id), request).await.expect("Error placing order")
    }

    pub async fn upload_proof(&self, user: &User, payment_id: i64) {
        let upload = ProofUpload::new("receipt.png", b"a screenshot of a transfer".to_vec());
        self.orders
            .upload_proof(&Actor::customer(user.id), payment_id, upload, &self.storage)
            .await
            .expect("Error uploading proof");
    }
}
