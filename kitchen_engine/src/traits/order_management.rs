use thiserror::Error;

use crate::{
    db_types::{Money, Order, OrderLine, OrderStatusType, Payment, PaymentStatus},
    order_objects::{CheckoutParams, OrderQueryFilter, OrderWithPayment, PaymentQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Payment #{payment_id} is {status}, which does not allow this operation")]
    WrongState { payment_id: i64, status: PaymentStatus },
    #[error("An order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("The kitchen is not accepting orders at the moment")]
    OrderingDisabled,
    #[error("The cart is empty")]
    EmptyCart,
    #[error("A payment of {amount} is not acceptable. Pay either the full {total} or the advance of {advance}")]
    InvalidAmount { amount: Money, total: Money, advance: Money },
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Payment #{0} does not exist")]
    PaymentNotFound(i64),
    #[error("No proof of payment has been uploaded for payment #{0}")]
    ProofNotFound(i64),
    #[error("Could not store the proof of payment. {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// The order and payment aggregates.
///
/// Every mutating method in this trait runs inside a single database transaction. Status changes are issued as
/// compare-and-set updates, so when two requests race for the same transition exactly one of them wins and the other
/// observes the new state.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Turns the customer's cart into an order, in one transaction:
    ///
    /// 1. The cart lines are snapshotted (name, price and quantity are copied from the live menu).
    /// 2. The subtotal, total and advance amount are computed, and the payment amount is validated against them.
    /// 3. The order (status `New`) and its lines are inserted.
    /// 4. The companion payment (status `Pending`) is inserted.
    /// 5. The cart is cleared.
    ///
    /// An empty cart fails with [`OrderFlowError::EmptyCart`]; an unavailable item fails with
    /// [`OrderFlowError::Validation`]. Nothing is written in either case.
    async fn create_order_from_cart(
        &self,
        user_id: i64,
        checkout: CheckoutParams,
    ) -> Result<OrderWithPayment, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;

    /// All the orders placed by the given user, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    /// Moves the order from `from` to `to`. The update only applies if the order is still in `from`. If it is not,
    /// [`OrderFlowError::InvalidTransition`] is returned with the status that was found.
    ///
    /// This method does not check the transition table. That is the caller's job.
    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, OrderFlowError>;

    async fn update_admin_notes(&self, order_id: i64, notes: Option<String>) -> Result<Order, OrderFlowError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError>;

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, OrderFlowError>;

    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, OrderFlowError>;

    /// Records a stored proof of payment. The payment moves to `ProofUploaded` and any earlier rejection reason is
    /// cleared. A confirmed payment fails with [`OrderFlowError::WrongState`].
    async fn attach_payment_proof(&self, payment_id: i64, proof_ref: &str) -> Result<Payment, OrderFlowError>;

    /// Confirms a payment that is in `ProofUploaded`, and moves the companion order from `New` to `Confirmed`, in one
    /// transaction. If the payment is in any other state, [`OrderFlowError::WrongState`] is returned. If the order is
    /// no longer `New`, [`OrderFlowError::InvalidTransition`] is returned and the payment is left untouched.
    async fn confirm_payment(
        &self,
        payment_id: i64,
        reviewer_id: i64,
        transaction_ref: Option<String>,
    ) -> Result<(Payment, Order), OrderFlowError>;

    /// Rejects a payment that is in `ProofUploaded`, storing the reason. The order is not touched.
    async fn reject_payment(&self, payment_id: i64, reviewer_id: i64, reason: &str) -> Result<Payment, OrderFlowError>;
}
