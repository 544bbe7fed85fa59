//! `SqliteDatabase` is a concrete implementation of a kitchen engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! Every state change runs in a transaction whose first statement is a write. In
//! SQLite that takes the write lock straight away, so a competing transaction waits (up to the busy timeout) and then
//! sees the committed result, rather than acting on a stale read.
use std::{collections::HashMap, fmt::Debug};

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{carts, db_url, menu, new_pool, orders, payments, settings, users};
use crate::{
    cart_objects::MergeSummary,
    db_types::{
        CartItem,
        CartLine,
        CartLineUpdate,
        CartOwner,
        CustomerSummary,
        MenuItem,
        MenuItemUpdate,
        NewCartLine,
        NewMenuItem,
        NewUser,
        Order,
        OrderLine,
        OrderStatusType,
        Payment,
        SettingsUpdate,
        SystemSettings,
        User,
    },
    order_objects::{CheckoutParams, OrderQueryFilter, OrderTotals, OrderWithPayment, PaymentQueryFilter},
    traits::{
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
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_menu(&self, available_only: bool) -> Result<Vec<MenuItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let items = menu::fetch_menu(available_only, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_menu_item(&self, id: i64) -> Result<Option<MenuItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let item = menu::fetch_menu_item(id, &mut conn).await?;
        Ok(item)
    }

    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let item = menu::insert_menu_item(item, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let item = menu::update_menu_item(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn delete_menu_item(&self, id: i64) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        menu::delete_menu_item(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn toggle_menu_item(&self, id: i64) -> Result<MenuItem, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let item = menu::toggle_menu_item(id, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn add_menu_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let item = menu::add_image(id, url, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_menu_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let item = menu::remove_image(id, url, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, owner: &CartOwner) -> Result<Vec<CartItem>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart(owner, &mut conn).await?;
        Ok(items)
    }

    async fn add_to_cart(
        &self,
        owner: &CartOwner,
        line: NewCartLine,
        max_quantity: i64,
    ) -> Result<CartLine, CartError> {
        let mut tx = self.pool.begin().await?;
        let line = carts::add_to_cart(owner, line, max_quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(line)
    }

    async fn update_cart_line(
        &self,
        owner: &CartOwner,
        line_id: i64,
        update: CartLineUpdate,
        max_quantity: i64,
    ) -> Result<CartLine, CartError> {
        let mut tx = self.pool.begin().await?;
        let line = carts::update_cart_line(owner, line_id, update, max_quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(line)
    }

    async fn remove_cart_line(&self, owner: &CartOwner, line_id: i64) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await?;
        carts::remove_cart_line(owner, line_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn clear_cart(&self, owner: &CartOwner) -> Result<u64, CartError> {
        let mut tx = self.pool.begin().await?;
        let n = carts::clear_cart(owner, &mut tx).await?;
        tx.commit().await?;
        Ok(n)
    }

    async fn merge_guest_cart(
        &self,
        session_id: &str,
        user_id: i64,
        max_quantity: i64,
    ) -> Result<MergeSummary, CartError> {
        let mut tx = self.pool.begin().await?;
        let summary = carts::merge_guest_cart(session_id, user_id, max_quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(summary)
    }
}

impl OrderManagement for SqliteDatabase {
    /// Takes the customer's cart and, in a single atomic transaction,
    /// * removes the cart lines (this is the first statement, so the cart cannot be checked out twice),
    /// * snapshots the name and current price of every item, failing if any of them is gone or switched off,
    /// * computes the totals and checks the requested payment amount,
    /// * inserts the order, its lines and the pending payment.
    async fn create_order_from_cart(
        &self,
        user_id: i64,
        checkout: CheckoutParams,
    ) -> Result<OrderWithPayment, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let cart_lines = carts::take_cart(&CartOwner::User(user_id), &mut tx).await?;
        if cart_lines.is_empty() {
            return Err(OrderFlowError::EmptyCart);
        }
        let ids = cart_lines.iter().map(|l| l.menu_item_id).collect::<Vec<_>>();
        let items = menu::fetch_menu_items(&ids, &mut tx).await?;
        let items = items.into_iter().map(|i| (i.id, i)).collect::<HashMap<i64, MenuItem>>();
        let mut snapshot = Vec::with_capacity(cart_lines.len());
        for line in cart_lines {
            let item = items.get(&line.menu_item_id).filter(|i| i.is_available).ok_or_else(|| {
                OrderFlowError::Validation(format!("Item #{} is no longer available", line.menu_item_id))
            })?;
            snapshot.push(CartItem {
                line_id: line.id,
                menu_item_id: item.id,
                name_en: item.name_en.clone(),
                name_ar: item.name_ar.clone(),
                unit_price: item.price,
                quantity: line.quantity,
                notes: line.notes,
                is_available: true,
            });
        }
        let totals = OrderTotals::from_cart(&snapshot, checkout.delivery_fee, checkout.advance_percentage);
        let amount = totals.resolve_payment_amount(checkout.payment_amount)?;
        let order = orders::insert_order(user_id, &totals, &checkout, &mut tx).await?;
        let mut lines = Vec::with_capacity(snapshot.len());
        for item in &snapshot {
            lines.push(orders::insert_order_line(order.id, item, &mut tx).await?);
        }
        let payment = payments::insert_payment(order.id, checkout.payment_method, amount, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} with {} lines and payment #{} committed", order.id, lines.len(), payment.id);
        Ok(OrderWithPayment { order, lines, payment })
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_order_status(order_id, from, to, &mut tx).await?;
        match updated {
            Some(order) => {
                tx.commit().await?;
                debug!("🗃️ Order #{order_id} moved from {from} to {to}");
                Ok(order)
            },
            None => {
                let current = orders::fetch_order(order_id, &mut tx).await?;
                tx.rollback().await?;
                match current {
                    Some(order) => Err(OrderFlowError::InvalidTransition { from: order.status, to }),
                    None => Err(OrderFlowError::OrderNotFound(order_id)),
                }
            },
        }
    }

    async fn update_admin_notes(&self, order_id: i64, notes: Option<String>) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_admin_notes(order_id, notes, &mut tx).await?;
        tx.commit().await?;
        order.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::search_payments(query, &mut conn).await?;
        Ok(payments)
    }

    async fn attach_payment_proof(&self, payment_id: i64, proof_ref: &str) -> Result<Payment, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        match payments::attach_proof(payment_id, proof_ref, &mut tx).await? {
            Some(payment) => {
                tx.commit().await?;
                Ok(payment)
            },
            None => {
                let current = payments::fetch_payment(payment_id, &mut tx).await?;
                tx.rollback().await?;
                Err(wrong_state_or_missing(payment_id, current))
            },
        }
    }

    /// Confirms the payment and the order in one transaction. The payment update comes first; if the order is no
    /// longer `New`, the whole transaction is rolled back.
    async fn confirm_payment(
        &self,
        payment_id: i64,
        reviewer_id: i64,
        transaction_ref: Option<String>,
    ) -> Result<(Payment, Order), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let Some(payment) = payments::confirm(payment_id, reviewer_id, transaction_ref, &mut tx).await? else {
            let current = payments::fetch_payment(payment_id, &mut tx).await?;
            tx.rollback().await?;
            return Err(wrong_state_or_missing(payment_id, current));
        };
        let target = OrderStatusType::Confirmed;
        let Some(order) = orders::update_order_status(payment.order_id, OrderStatusType::New, target, &mut tx).await?
        else {
            let current = orders::fetch_order(payment.order_id, &mut tx).await?;
            tx.rollback().await?;
            warn!("🗃️ Payment #{payment_id} could not be confirmed because order #{} is not New", payment.order_id);
            return match current {
                Some(order) => Err(OrderFlowError::InvalidTransition { from: order.status, to: target }),
                None => Err(OrderFlowError::OrderNotFound(payment.order_id)),
            };
        };
        tx.commit().await?;
        debug!("🗃️ Payment #{payment_id} and order #{} confirmed", order.id);
        Ok((payment, order))
    }

    async fn reject_payment(&self, payment_id: i64, reviewer_id: i64, reason: &str) -> Result<Payment, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        match payments::reject(payment_id, reviewer_id, reason, &mut tx).await? {
            Some(payment) => {
                tx.commit().await?;
                Ok(payment)
            },
            None => {
                let current = payments::fetch_payment(payment_id, &mut tx).await?;
                tx.rollback().await?;
                Err(wrong_state_or_missing(payment_id, current))
            },
        }
    }
}

fn wrong_state_or_missing(payment_id: i64, current: Option<Payment>) -> OrderFlowError {
    match current {
        Some(p) => OrderFlowError::WrongState { payment_id, status: p.status },
        None => OrderFlowError::PaymentNotFound(payment_id),
    }
}

impl AccountManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_customers(&self) -> Result<Vec<CustomerSummary>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let customers = users::fetch_customers(&mut conn).await?;
        Ok(customers)
    }
}

impl SettingsManagement for SqliteDatabase {
    async fn fetch_settings(&self) -> Result<SystemSettings, SettingsError> {
        let mut conn = self.pool.acquire().await?;
        let settings = settings::fetch_settings(&mut conn).await?;
        Ok(settings)
    }

    /// Writes the changed keys first, then reads the merged settings back and validates them. Invalid settings roll
    /// the whole update back.
    async fn update_settings(&self, update: SettingsUpdate) -> Result<SystemSettings, SettingsError> {
        let mut tx = self.pool.begin().await?;
        settings::write_settings(update.to_pairs(), &mut tx).await?;
        let updated = settings::fetch_settings(&mut tx).await?;
        if let Err(e) = updated.validate() {
            tx.rollback().await?;
            return Err(SettingsError::InvalidSettings(e));
        }
        tx.commit().await?;
        Ok(updated)
    }

    async fn toggle_ordering(&self) -> Result<bool, SettingsError> {
        let mut tx = self.pool.begin().await?;
        let enabled = settings::toggle_ordering(&mut tx).await?;
        tx.commit().await?;
        Ok(enabled)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `KITCHEN_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
