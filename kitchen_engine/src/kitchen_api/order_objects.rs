use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{
        CartItem,
        Money,
        Order,
        OrderLine,
        OrderStatusType,
        Payment,
        PaymentMethod,
        PaymentStatus,
    },
    traits::OrderFlowError,
};

//--------------------------------------         Actor         ---------------------------------------------------------
/// The identity on whose behalf an API call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Actor {
    pub fn customer(user_id: i64) -> Self {
        Self { user_id, is_admin: false }
    }

    pub fn admin(user_id: i64) -> Self {
        Self { user_id, is_admin: true }
    }

    pub fn owns(&self, order: &Order) -> bool {
        order.user_id == self.user_id
    }

    /// Admins may see everything; customers may only see their own orders.
    pub fn can_view(&self, order: &Order) -> bool {
        self.is_admin || self.owns(order)
    }
}

/// Decides whether `actor` may move `order` to `target`.
///
/// Admins may follow any edge of the order state machine. The owner may only cancel. Nobody may request `Confirmed`,
/// since that state is reached through payment confirmation alone.
pub fn check_transition(actor: &Actor, order: &Order, target: OrderStatusType) -> Result<(), OrderFlowError> {
    let owner_cancelling = actor.owns(order) && target == OrderStatusType::Cancelled;
    if !actor.is_admin && !owner_cancelling {
        return Err(OrderFlowError::Forbidden(format!(
            "User #{} may not move order #{} to {target}",
            actor.user_id, order.id
        )));
    }
    if target == OrderStatusType::Confirmed || !order.status.can_transition_to(target) {
        return Err(OrderFlowError::InvalidTransition { from: order.status, to: target });
    }
    Ok(())
}

//--------------------------------------       Checkout        ---------------------------------------------------------
/// What the customer submits at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub delivery_address: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the minimum delivery fee when absent.
    #[serde(default)]
    pub delivery_fee: Option<Money>,
    pub payment_method: PaymentMethod,
    /// Defaults to the advance amount when absent.
    #[serde(default)]
    pub payment_amount: Option<Money>,
}

impl NewOrderRequest {
    pub fn new<S: Into<String>>(delivery_address: S, payment_method: PaymentMethod) -> Self {
        Self {
            delivery_address: delivery_address.into(),
            notes: None,
            delivery_fee: None,
            payment_method,
            payment_amount: None,
        }
    }

    pub fn with_delivery_fee(mut self, fee: Money) -> Self {
        self.delivery_fee = Some(fee);
        self
    }

    pub fn with_payment_amount(mut self, amount: Money) -> Self {
        self.payment_amount = Some(amount);
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A checkout request after it has been validated against the system settings. This is what the backend receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutParams {
    pub delivery_address: String,
    pub notes: Option<String>,
    pub delivery_fee: Money,
    pub payment_method: PaymentMethod,
    pub payment_amount: Option<Money>,
    pub advance_percentage: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub advance_amount: Money,
}

impl OrderTotals {
    pub fn new(subtotal: Money, delivery_fee: Money, advance_percentage: i64) -> Self {
        let total = subtotal + delivery_fee;
        let advance_amount = if advance_percentage < 100 { total.percentage_ceil(advance_percentage) } else { total };
        Self { subtotal, delivery_fee, total, advance_amount }
    }

    pub fn from_cart(items: &[CartItem], delivery_fee: Money, advance_percentage: i64) -> Self {
        let subtotal = items.iter().map(CartItem::line_total).sum();
        Self::new(subtotal, delivery_fee, advance_percentage)
    }

    /// Works out what the payment for this order will be. An explicit amount must be either the total or the advance
    /// amount. Without one, the advance amount is used.
    pub fn resolve_payment_amount(&self, requested: Option<Money>) -> Result<Money, OrderFlowError> {
        match requested {
            None => Ok(self.advance_amount),
            Some(amount) if amount == self.total || amount == self.advance_amount => Ok(amount),
            Some(amount) => {
                Err(OrderFlowError::InvalidAmount { amount, total: self.total, advance: self.advance_amount })
            },
        }
    }
}

/// An order, its line snapshots and its payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithPayment {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub payment: Payment,
}

//--------------------------------------      Query filters    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQueryFilter {
    pub order_id: Option<i64>,
    pub status: Option<Vec<PaymentStatus>>,
    pub method: Option<PaymentMethod>,
}

impl PaymentQueryFilter {
    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.method.is_none()
    }
}
