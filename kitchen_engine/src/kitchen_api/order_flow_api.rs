use std::fmt::Debug;

use log::*;

use crate::{
    cart_objects::ReorderSummary,
    db_types::{CartOwner, NewCartLine, Order, OrderStatusType, Payment, PaymentStatus},
    order_objects::{
        check_transition,
        Actor,
        CheckoutParams,
        NewOrderRequest,
        OrderQueryFilter,
        OrderWithPayment,
        PaymentQueryFilter,
    },
    proof_storage::{ProofStorage, ProofUpload},
    traits::{CartError, CartManagement, OrderFlowError, OrderManagement, SettingsManagement},
};

/// `OrderFlowApi` is the primary API for the order lifecycle and the payment-verification workflow.
///
/// It enforces who may do what. The backend enforces the state machines atomically.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + SettingsManagement
{
    /// Places an order from the contents of the actor's cart.
    ///
    /// The ordering toggle, the delivery address and the delivery fee are checked here. The cart snapshot, the
    /// payment amount check and the writes happen in one backend transaction.
    pub async fn place_order(
        &self,
        actor: &Actor,
        request: NewOrderRequest,
    ) -> Result<OrderWithPayment, OrderFlowError> {
        let settings = self.db.fetch_settings().await?;
        if !settings.ordering_enabled {
            debug!("🔄️📦️ User #{} tried to order while ordering is disabled", actor.user_id);
            return Err(OrderFlowError::OrderingDisabled);
        }
        let delivery_address = request.delivery_address.trim().to_string();
        if delivery_address.is_empty() {
            return Err(OrderFlowError::Validation("A delivery address is required".into()));
        }
        let delivery_fee = request.delivery_fee.unwrap_or(settings.delivery_fee_min);
        if !settings.delivery_fee_in_range(delivery_fee) {
            return Err(OrderFlowError::Validation(format!(
                "The delivery fee must be between {} and {}",
                settings.delivery_fee_min, settings.delivery_fee_max
            )));
        }
        let params = CheckoutParams {
            delivery_address,
            notes: request.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            delivery_fee,
            payment_method: request.payment_method,
            payment_amount: request.payment_amount,
            advance_percentage: settings.advance_percentage,
        };
        let result = self.db.create_order_from_cart(actor.user_id, params).await?;
        info!(
            "🔄️📦️ Order #{} placed by user #{} for {}. Payment #{} of {} via {} is pending",
            result.order.id,
            actor.user_id,
            result.order.total,
            result.payment.id,
            result.payment.amount,
            result.payment.method
        );
        Ok(result)
    }

    /// Fetches an order with its lines and payment. Customers can only see their own orders.
    pub async fn order(&self, actor: &Actor, order_id: i64) -> Result<OrderWithPayment, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        if !actor.can_view(&order) {
            return Err(OrderFlowError::Forbidden(format!("Order #{order_id} belongs to someone else")));
        }
        let lines = self.db.fetch_order_lines(order_id).await?;
        let payment = self.db.fetch_payment_for_order(order_id).await?.ok_or_else(|| {
            error!("🔄️📦️ Order #{order_id} has no payment record. The checkout invariant has been broken");
            OrderFlowError::DatabaseError(format!("Order #{order_id} has no payment record"))
        })?;
        Ok(OrderWithPayment { order, lines, payment })
    }

    pub async fn my_orders(&self, actor: &Actor) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders_for_user(actor.user_id).await
    }

    /// The orders of any customer, newest first. Callers must make sure the actor is an admin.
    pub async fn customer_orders(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders_for_user(customer_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        self.db.search_orders(query).await
    }

    /// Moves an order to `target`.
    ///
    /// Admins may follow any edge of the order state machine except into `Confirmed`, which only payment
    /// confirmation may do. The owner of the order may cancel it while it is `New`, `Confirmed` or `Preparing`.
    pub async fn change_order_status(
        &self,
        actor: &Actor,
        order_id: i64,
        target: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        check_transition(actor, &order, target)?;
        let updated = self.db.update_order_status(order_id, order.status, target).await?;
        info!("🔄️📦️ Order #{order_id} moved from {} to {target} by user #{}", order.status, actor.user_id);
        Ok(updated)
    }

    pub async fn update_admin_notes(&self, order_id: i64, notes: Option<String>) -> Result<Order, OrderFlowError> {
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.db.update_admin_notes(order_id, notes).await
    }

    /// Fetches a payment. Customers can only see payments for their own orders.
    pub async fn payment(&self, actor: &Actor, payment_id: i64) -> Result<Payment, OrderFlowError> {
        let (payment, _) = self.payment_and_order(actor, payment_id).await?;
        Ok(payment)
    }

    /// Stores a proof of payment and moves the payment to `ProofUploaded`.
    ///
    /// Only the customer who placed the order may upload. The file goes to `storage` first; the payment record is
    /// only touched once the storage has returned a reference. If the payment changed state in the meantime, the new
    /// file is removed again.
    pub async fn upload_proof<S: ProofStorage>(
        &self,
        actor: &Actor,
        payment_id: i64,
        upload: ProofUpload,
        storage: &S,
    ) -> Result<Payment, OrderFlowError> {
        let payment = self.fetch_payment(payment_id).await?;
        let order = self.fetch_order(payment.order_id).await?;
        if !actor.owns(&order) {
            return Err(OrderFlowError::Forbidden(format!(
                "Only the customer who placed order #{} may upload a proof of payment",
                order.id
            )));
        }
        if !payment.status.accepts_proof() {
            return Err(OrderFlowError::WrongState { payment_id, status: payment.status });
        }
        let proof_ref = storage.store_proof(payment_id, upload).await?;
        let payment = match self.db.attach_payment_proof(payment_id, &proof_ref).await {
            Ok(payment) => payment,
            Err(e) => {
                self.discard_proof(payment_id, &proof_ref, storage).await;
                return Err(e);
            },
        };
        info!("🔄️💰️ Proof of payment uploaded for payment #{payment_id} (order #{})", order.id);
        Ok(payment)
    }

    /// Removes a proof that never made it onto the payment record. Identical uploads share a reference, so a file the
    /// payment still points at is kept.
    async fn discard_proof<S: ProofStorage>(&self, payment_id: i64, proof_ref: &str, storage: &S) {
        match self.db.fetch_payment(payment_id).await {
            Ok(Some(p)) if p.proof_ref.as_deref() == Some(proof_ref) => return,
            Ok(_) => {},
            Err(e) => {
                warn!("🔄️💰️ Could not check payment #{payment_id} before removing proof {proof_ref}. {e}");
                return;
            },
        }
        match storage.remove_proof(proof_ref).await {
            Ok(()) => debug!("🔄️💰️ Removed unused proof {proof_ref} for payment #{payment_id}"),
            Err(e) => warn!("🔄️💰️ Could not remove unused proof {proof_ref} for payment #{payment_id}. {e}"),
        }
    }

    /// Reads back the stored proof for a payment, returning the reference and the file contents.
    pub async fn fetch_proof<S: ProofStorage>(
        &self,
        actor: &Actor,
        payment_id: i64,
        storage: &S,
    ) -> Result<(String, Vec<u8>), OrderFlowError> {
        let (payment, _) = self.payment_and_order(actor, payment_id).await?;
        let proof_ref = payment.proof_ref.ok_or(OrderFlowError::ProofNotFound(payment_id))?;
        let content = storage.fetch_proof(&proof_ref).await?;
        Ok((proof_ref, content))
    }

    /// Confirms a payment and, with it, the order. Admins only.
    pub async fn confirm_payment(
        &self,
        actor: &Actor,
        payment_id: i64,
        transaction_ref: Option<String>,
    ) -> Result<(Payment, Order), OrderFlowError> {
        require_admin(actor, "confirm payments")?;
        let transaction_ref = transaction_ref.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let (payment, order) = self.db.confirm_payment(payment_id, actor.user_id, transaction_ref).await?;
        info!(
            "🔄️✅️ Payment #{payment_id} confirmed by admin #{}. Order #{} is now {}",
            actor.user_id, order.id, order.status
        );
        Ok((payment, order))
    }

    /// Rejects a payment, recording the reason. The order stays where it is. Admins only.
    pub async fn reject_payment(
        &self,
        actor: &Actor,
        payment_id: i64,
        reason: &str,
    ) -> Result<Payment, OrderFlowError> {
        require_admin(actor, "reject payments")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(OrderFlowError::Validation("A reason is required when rejecting a payment".into()));
        }
        let payment = self.db.reject_payment(payment_id, actor.user_id, reason).await?;
        info!("🔄️❌️ Payment #{payment_id} rejected by admin #{}: {reason}", actor.user_id);
        Ok(payment)
    }

    /// Payments with a proof that is waiting for review, oldest first.
    pub async fn pending_payments(&self) -> Result<Vec<Payment>, OrderFlowError> {
        self.db.search_payments(PaymentQueryFilter::default().with_status(PaymentStatus::ProofUploaded)).await
    }

    pub async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, OrderFlowError> {
        self.db.search_payments(query).await
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Payment, OrderFlowError> {
        self.db.fetch_payment(payment_id).await?.ok_or(OrderFlowError::PaymentNotFound(payment_id))
    }

    async fn payment_and_order(&self, actor: &Actor, payment_id: i64) -> Result<(Payment, Order), OrderFlowError> {
        let payment = self.fetch_payment(payment_id).await?;
        let order = self.fetch_order(payment.order_id).await?;
        if !actor.can_view(&order) {
            return Err(OrderFlowError::Forbidden(format!("Payment #{payment_id} belongs to someone else")));
        }
        Ok((payment, order))
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + CartManagement + SettingsManagement
{
    /// Copies the lines of a past order back into the customer's cart.
    ///
    /// Items that have been removed from the menu, are switched off, or would go over the per-item maximum are
    /// skipped. Current menu prices apply, not the prices on the old order.
    pub async fn reorder(&self, actor: &Actor, order_id: i64) -> Result<ReorderSummary, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        if !actor.owns(&order) {
            return Err(OrderFlowError::Forbidden(format!("Order #{order_id} belongs to someone else")));
        }
        let max = self.db.fetch_settings().await?.max_quantity_per_item;
        let owner = CartOwner::User(actor.user_id);
        let mut summary = ReorderSummary::default();
        for line in self.db.fetch_order_lines(order_id).await? {
            let new_line =
                NewCartLine { menu_item_id: line.menu_item_id, quantity: line.quantity.min(max), notes: line.notes };
            match self.db.add_to_cart(&owner, new_line, max).await {
                Ok(_) => summary.added.push(line.menu_item_id),
                Err(CartError::DatabaseError(e)) => return Err(OrderFlowError::DatabaseError(e)),
                Err(e) => {
                    debug!("🔄️📦️ Skipping item #{} while reordering order #{order_id}. {e}", line.menu_item_id);
                    summary.skipped.push(line.menu_item_id);
                },
            }
        }
        info!(
            "🔄️📦️ User #{} reordered order #{order_id}. {} items added, {} skipped",
            actor.user_id,
            summary.added.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}

fn require_admin(actor: &Actor, action: &str) -> Result<(), OrderFlowError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(OrderFlowError::Forbidden(format!("Only admins may {action}")))
    }
}
