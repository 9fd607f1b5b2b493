//! crates/agro_shop_core/src/orders.rs
//!
//! The order service: turns a cart snapshot into a persisted order and drives
//! the side effects that go with it.
//!
//! Collaborator categories for `place_order`:
//! - database write: must succeed, aborts the request otherwise
//! - payment reference: best-effort, built after the write; a failure is
//!   logged and the order is returned with `qr: None`
//! - confirmation mail: best-effort, queued on the `NotificationDispatcher`

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    NewOrder, Order, OrderItem, OrderOwner, OrderWithOwner, PaymentMethod, PriceBreakdown,
    ShippingAddress,
};
use crate::locks::UserLocks;
use crate::notify::{Notification, NotificationDispatcher};
use crate::ports::{DatabaseService, PaymentReferenceService, PortError, PortResult};

//=========================================================================================
// Request / Result Types
//=========================================================================================

/// A checkout as submitted by the client. Item names and prices are trusted
/// as sent; nothing is re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub prices: PriceBreakdown,
}

/// What a successful checkout returns: the stored order and, for online
/// payment, the QR payment reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub qr: Option<String>,
}

//=========================================================================================
// The Service
//=========================================================================================

#[derive(Clone)]
pub struct OrderService {
    db: Arc<dyn DatabaseService>,
    payments: Arc<dyn PaymentReferenceService>,
    notifier: NotificationDispatcher,
    locks: UserLocks,
}

impl OrderService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        payments: Arc<dyn PaymentReferenceService>,
        notifier: NotificationDispatcher,
        locks: UserLocks,
    ) -> Self {
        Self {
            db,
            payments,
            notifier,
            locks,
        }
    }

    /// Places an order for `user_id`.
    ///
    /// The stored `total_price` is the caller's figure, unchecked against the
    /// items. Stock is neither checked nor decremented. When `idempotency_key`
    /// matches an earlier order of the same user, that order is returned and
    /// nothing new is written or mailed.
    pub async fn place_order(
        &self,
        user_id: Uuid,
        request: PlaceOrderRequest,
        idempotency_key: Option<&str>,
    ) -> PortResult<PlacedOrder> {
        if request.order_items.is_empty() {
            return Err(PortError::Validation("No order items".to_string()));
        }

        let _guard = self.locks.lock(user_id).await;
        let user = self.db.get_user(user_id).await?;

        if let Some(key) = idempotency_key {
            if let Some(existing) = self.db.find_order_by_idempotency_key(user_id, key).await? {
                info!(order_id = %existing.id, user_id = %user_id, "Checkout replayed; returning existing order");
                let qr = self.payment_reference_for(&existing, &user.email);
                return Ok(PlacedOrder { order: existing, qr });
            }
        }

        let order = self
            .db
            .place_order(NewOrder {
                user: user_id,
                order_items: request.order_items,
                shipping_address: request.shipping_address,
                payment_method: request.payment_method,
                prices: request.prices,
                idempotency_key: idempotency_key.map(str::to_string),
            })
            .await?;
        info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total_price,
            payment_method = %order.payment_method,
            "Order placed"
        );

        self.notifier
            .dispatch(Notification::order_placed(&user.email, &order));
        let qr = self.payment_reference_for(&order, &user.email);

        Ok(PlacedOrder { order, qr })
    }

    /// Admin status change. "Delivered" latches `is_delivered`; the owner is
    /// mailed best-effort.
    pub async fn update_status(&self, order_id: Uuid, status: &str) -> PortResult<Order> {
        let mut order = self.db.get_order(order_id).await.map_err(not_found_as_order)?;
        order.apply_status(status);
        let order = self.db.save_order(&order).await?;
        info!(order_id = %order.id, status = %order.status, is_delivered = order.is_delivered, "Order status updated");

        match self.db.get_user(order.user).await {
            Ok(owner) => self
                .notifier
                .dispatch(Notification::order_status_changed(&owner.email, &order)),
            Err(e) => warn!(order_id = %order.id, error = %e, "Order owner not found; status mail skipped"),
        }
        Ok(order)
    }

    /// A single order with its owner's name and email.
    pub async fn get_order(&self, order_id: Uuid) -> PortResult<OrderWithOwner> {
        let order = self.db.get_order(order_id).await.map_err(not_found_as_order)?;
        self.with_owner(order).await
    }

    pub async fn list_user_orders(&self, user_id: Uuid) -> PortResult<Vec<Order>> {
        self.db.list_orders_for_user(user_id).await
    }

    pub async fn list_all_orders(&self) -> PortResult<Vec<OrderWithOwner>> {
        let orders = self.db.list_orders().await?;
        let mut populated = Vec::with_capacity(orders.len());
        for order in orders {
            populated.push(self.with_owner(order).await?);
        }
        Ok(populated)
    }

    async fn with_owner(&self, order: Order) -> PortResult<OrderWithOwner> {
        let owner = match self.db.get_user(order.user).await {
            Ok(user) => Some(OrderOwner::from(&user)),
            Err(PortError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(OrderWithOwner { order, owner })
    }

    /// The order is already committed when this runs, so a failure here
    /// must not fail the checkout.
    fn payment_reference_for(&self, order: &Order, email: &str) -> Option<String> {
        if order.payment_method == PaymentMethod::Cod {
            return None;
        }
        match self.payments.payment_reference(order.id, order.total_price, email) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Payment reference unavailable");
                None
            }
        }
    }
}

fn not_found_as_order(e: PortError) -> PortError {
    match e {
        PortError::NotFound(_) => PortError::NotFound("Order not found".to_string()),
        other => other,
    }
}
