//! Data types that are stored in, and returned from, the kitchen database.
//!
//! The state machines for orders and payments live here too, since they are properties of the stored records
//! rather than of any particular backend.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use kitchen_common::Money;
use kitchen_common::parse_boolean;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

/// The most a single menu item (or delivery fee) may cost. Together with the per-item quantity cap this keeps every
/// cart and order total far away from integer overflow.
pub const MAX_PRICE: i64 = 1_000_000;
/// The largest value an admin may choose for `max_quantity_per_item`.
pub const MAX_QUANTITY_LIMIT: i64 = 1_000;

fn check_price(price: Money) -> Result<(), String> {
    if !price.is_positive() {
        return Err(format!("Menu item price must be positive, not {price}"));
    }
    if price.value() > MAX_PRICE {
        return Err(format!("Menu item price cannot be more than {}, not {price}", Money::from(MAX_PRICE)));
    }
    Ok(())
}

//--------------------------------------       MenuItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub category: Option<String>,
    pub price: Money,
    pub is_available: bool,
    /// Loaded from `menu_item_images`, in the order they were added.
    #[sqlx(skip)]
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub name_en: String,
    pub name_ar: String,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Money,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl NewMenuItem {
    pub fn new<S: Into<String>>(name_en: S, name_ar: S, price: Money) -> Self {
        Self {
            name_en: name_en.into(),
            name_ar: name_ar.into(),
            description_en: None,
            description_ar: None,
            category: None,
            price,
            is_available: true,
            image_urls: Vec::new(),
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Checks that both names are present, that the price is in range and that no image URL is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.name_en.trim().is_empty() || self.name_ar.trim().is_empty() {
            return Err("A menu item needs both an English and an Arabic name".into());
        }
        check_price(self.price)?;
        if self.image_urls.iter().any(|u| u.trim().is_empty()) {
            return Err("Image URLs cannot be blank".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name_en: Option<String>,
    pub name_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub is_available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.is_available = Some(available);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name_en.is_none() &&
            self.name_ar.is_none() &&
            self.description_en.is_none() &&
            self.description_ar.is_none() &&
            self.category.is_none() &&
            self.price.is_none() &&
            self.is_available.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(price) = self.price {
            check_price(price)?;
        }
        let blank = |s: &Option<String>| s.as_ref().map(|s| s.trim().is_empty()).unwrap_or(false);
        if blank(&self.name_en) || blank(&self.name_ar) {
            return Err("Menu item names cannot be blank".into());
        }
        Ok(())
    }
}

//--------------------------------------         User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// A customer account as the admins see it in the customer list.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CustomerSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub order_count: i64,
    /// The sum of the totals of the customer's delivered orders.
    pub total_spent: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
}

//--------------------------------------       CartOwner       ---------------------------------------------------------
/// Identifies whose cart is being addressed. Guests are identified by an opaque session id; signed-in customers by
/// their user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartOwner {
    User(i64),
    Guest(String),
}

impl Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOwner::User(id) => write!(f, "user #{id}"),
            CartOwner::Guest(session) => write!(f, "guest session {session}"),
        }
    }
}

//--------------------------------------       CartLine        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CartLine {
    pub id: i64,
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with the live menu data for its item.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CartItem {
    pub line_id: i64,
    pub menu_item_id: i64,
    pub name_en: String,
    pub name_ar: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub notes: Option<String>,
    pub is_available: bool,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartLine {
    pub menu_item_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

impl NewCartLine {
    pub fn new(menu_item_id: i64, quantity: i64) -> Self {
        Self { menu_item_id, quantity, notes: None }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdate {
    pub quantity: Option<i64>,
    /// `None` leaves the note as it is. A blank note removes it.
    pub notes: Option<String>,
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed. The kitchen is waiting for the payment to be verified.
    New,
    /// The payment was verified by an admin.
    Confirmed,
    /// The kitchen is preparing the food.
    Preparing,
    /// The order has been dispatched.
    OnTheWay,
    /// The order was handed to the customer.
    Delivered,
    /// The order was cancelled by the customer or an admin.
    Cancelled,
}

impl OrderStatusType {
    /// The states that can be reached in a single step from this one.
    pub fn successors(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            New => &[Confirmed, Cancelled],
            Confirmed => &[Preparing, Cancelled],
            Preparing => &[OnTheWay, Cancelled],
            OnTheWay => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    pub fn all() -> [OrderStatusType; 6] {
        use OrderStatusType::*;
        [New, Confirmed, Preparing, OnTheWay, Delivered, Cancelled]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "New"),
            OrderStatusType::Confirmed => write!(f, "Confirmed"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::OnTheWay => write!(f, "OnTheWay"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Confirmed" => Ok(Self::Confirmed),
            "Preparing" => Ok(Self::Preparing),
            "OnTheWay" => Ok(Self::OnTheWay),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to New");
            OrderStatusType::New
        })
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No proof of payment has been supplied yet.
    Pending,
    /// The customer uploaded a proof of payment that is waiting for review.
    ProofUploaded,
    /// An admin verified the payment. This is final.
    Confirmed,
    /// An admin rejected the proof. The customer may upload a new one.
    Rejected,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, next) {
            (Pending, ProofUploaded) => true,
            (ProofUploaded, ProofUploaded | Confirmed | Rejected) => true,
            (Rejected, ProofUploaded) => true,
            (Pending, Pending | Confirmed | Rejected) => false,
            (ProofUploaded, Pending) => false,
            (Rejected, Pending | Confirmed | Rejected) => false,
            (Confirmed, _) => false,
        }
    }

    pub fn accepts_proof(&self) -> bool {
        self.can_transition_to(PaymentStatus::ProofUploaded)
    }

    pub fn is_awaiting_review(&self) -> bool {
        matches!(self, PaymentStatus::ProofUploaded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::ProofUploaded => write!(f, "ProofUploaded"),
            PaymentStatus::Confirmed => write!(f, "Confirmed"),
            PaymentStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "ProofUploaded" => Ok(Self::ProofUploaded),
            "Confirmed" => Ok(Self::Confirmed),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    Instapay,
    VodafoneCash,
    OrangeMoney,
    EtisalatWallet,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn all() -> [PaymentMethod; 5] {
        use PaymentMethod::*;
        [Instapay, VodafoneCash, OrangeMoney, EtisalatWallet, CashOnDelivery]
    }

    pub fn name_en(&self) -> &'static str {
        match self {
            PaymentMethod::Instapay => "InstaPay",
            PaymentMethod::VodafoneCash => "Vodafone Cash",
            PaymentMethod::OrangeMoney => "Orange Money",
            PaymentMethod::EtisalatWallet => "Etisalat Wallet",
            PaymentMethod::CashOnDelivery => "Cash on delivery",
        }
    }

    pub fn name_ar(&self) -> &'static str {
        match self {
            PaymentMethod::Instapay => "إنستاباي",
            PaymentMethod::VodafoneCash => "فودافون كاش",
            PaymentMethod::OrangeMoney => "أورانج موني",
            PaymentMethod::EtisalatWallet => "اتصالات كاش",
            PaymentMethod::CashOnDelivery => "الدفع عند الاستلام",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Instapay => "Instapay",
            PaymentMethod::VodafoneCash => "VodafoneCash",
            PaymentMethod::OrangeMoney => "OrangeMoney",
            PaymentMethod::EtisalatWallet => "EtisalatWallet",
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
        };
        f.write_str(s)
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Instapay" => Ok(Self::Instapay),
            "VodafoneCash" => Ok(Self::VodafoneCash),
            "OrangeMoney" => Ok(Self::OrangeMoney),
            "EtisalatWallet" => Ok(Self::EtisalatWallet),
            "CashOnDelivery" => Ok(Self::CashOnDelivery),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub advance_amount: Money,
    pub delivery_address: String,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A snapshot of a cart line, taken when the order was placed. Later menu changes do not touch it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name_en: String,
    pub name_ar: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub notes: Option<String>,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    pub proof_ref: Option<String>,
    pub rejection_reason: Option<String>,
    pub transaction_ref: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    SystemSettings     ---------------------------------------------------------
pub const ORDERING_ENABLED: &str = "ordering_enabled";
pub const ADVANCE_PERCENTAGE: &str = "advance_percentage";
pub const DELIVERY_FEE_MIN: &str = "delivery_fee_min";
pub const DELIVERY_FEE_MAX: &str = "delivery_fee_max";
pub const MAX_QUANTITY_PER_ITEM: &str = "max_quantity_per_item";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub ordering_enabled: bool,
    /// The share of the order total (in percent) that must be paid up front.
    pub advance_percentage: i64,
    pub delivery_fee_min: Money,
    pub delivery_fee_max: Money,
    pub max_quantity_per_item: i64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            ordering_enabled: true,
            advance_percentage: 20,
            delivery_fee_min: Money::from(40),
            delivery_fee_max: Money::from(80),
            max_quantity_per_item: 20,
        }
    }
}

impl SystemSettings {
    /// Builds the settings from raw key/value rows. Unknown keys are ignored, and malformed values fall back to their
    /// defaults with an error in the log.
    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut settings = Self::default();
        for (key, value) in pairs {
            if let Err(e) = settings.apply(&key, &value) {
                error!("🗃️ Ignoring stored setting. {e}");
            }
        }
        settings
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConversionError> {
        let bad = |e: &dyn Display| ConversionError(format!("{key} has an invalid value '{value}'. {e}"));
        match key {
            ORDERING_ENABLED => self.ordering_enabled = parse_boolean(value).ok_or_else(|| bad(&"Expected a boolean"))?,
            ADVANCE_PERCENTAGE => self.advance_percentage = value.trim().parse().map_err(|e| bad(&e))?,
            DELIVERY_FEE_MIN => self.delivery_fee_min = value.parse().map_err(|e| bad(&e))?,
            DELIVERY_FEE_MAX => self.delivery_fee_max = value.parse().map_err(|e| bad(&e))?,
            MAX_QUANTITY_PER_ITEM => self.max_quantity_per_item = value.trim().parse().map_err(|e| bad(&e))?,
            _ => {},
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.advance_percentage) {
            return Err(format!("The advance percentage must be between 1 and 100, not {}", self.advance_percentage));
        }
        if self.delivery_fee_min.value() < 0 {
            return Err("The minimum delivery fee cannot be negative".into());
        }
        if self.delivery_fee_min > self.delivery_fee_max {
            return Err(format!(
                "The minimum delivery fee ({}) is larger than the maximum ({})",
                self.delivery_fee_min, self.delivery_fee_max
            ));
        }
        if self.delivery_fee_max.value() > MAX_PRICE {
            return Err(format!("The maximum delivery fee cannot be more than {}", Money::from(MAX_PRICE)));
        }
        if !(1..=MAX_QUANTITY_LIMIT).contains(&self.max_quantity_per_item) {
            return Err(format!(
                "The maximum quantity per item must be between 1 and {MAX_QUANTITY_LIMIT}, not {}",
                self.max_quantity_per_item
            ));
        }
        Ok(())
    }

    pub fn delivery_fee_in_range(&self, fee: Money) -> bool {
        fee >= self.delivery_fee_min && fee <= self.delivery_fee_max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub ordering_enabled: Option<bool>,
    pub advance_percentage: Option<i64>,
    pub delivery_fee_min: Option<Money>,
    pub delivery_fee_max: Option<Money>,
    pub max_quantity_per_item: Option<i64>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.ordering_enabled.is_none() &&
            self.advance_percentage.is_none() &&
            self.delivery_fee_min.is_none() &&
            self.delivery_fee_max.is_none() &&
            self.max_quantity_per_item.is_none()
    }

    /// The key/value rows for the fields that this update changes.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = self.ordering_enabled {
            pairs.push((ORDERING_ENABLED, v.to_string()));
        }
        if let Some(v) = self.advance_percentage {
            pairs.push((ADVANCE_PERCENTAGE, v.to_string()));
        }
        if let Some(v) = self.delivery_fee_min {
            pairs.push((DELIVERY_FEE_MIN, v.value().to_string()));
        }
        if let Some(v) = self.delivery_fee_max {
            pairs.push((DELIVERY_FEE_MAX, v.value().to_string()));
        }
        if let Some(v) = self.max_quantity_per_item {
            pairs.push((MAX_QUANTITY_PER_ITEM, v.to_string()));
        }
        pairs
    }

    /// Returns a copy of `current` with this update applied. The result is not validated.
    pub fn apply_to(&self, current: &SystemSettings) -> SystemSettings {
        SystemSettings {
            ordering_enabled: self.ordering_enabled.unwrap_or(current.ordering_enabled),
            advance_percentage: self.advance_percentage.unwrap_or(current.advance_percentage),
            delivery_fee_min: self.delivery_fee_min.unwrap_or(current.delivery_fee_min),
            delivery_fee_max: self.delivery_fee_max.unwrap_or(current.delivery_fee_max),
            max_quantity_per_item: self.max_quantity_per_item.unwrap_or(current.max_quantity_per_item),
        }
    }
}
