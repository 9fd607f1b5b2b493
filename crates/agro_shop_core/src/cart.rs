//! crates/agro_shop_core/src/cart.rs
//!
//! The client-side cart state holder. It owns `{ items, total }`, recomputes
//! the total after every mutation, persists the whole state through a
//! `CartStorage` after every mutation, and talks to the order service only at
//! checkout.
//!
//! A checkout attempt is tagged with an idempotency key that is persisted with
//! the cart and reused on every retry until the order goes through or the
//! cart changes, so a lost response never turns into a second order.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{OrderItem, PaymentMethod, PriceBreakdown, ShippingAddress, MAX_CART_QUANTITY};
use crate::orders::{PlaceOrderRequest, PlacedOrder};
use crate::ports::{CartStorage, OrderGateway, PortError, PortResult};

/// The flat delivery charge the storefront adds at checkout.
pub const DELIVERY_CHARGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Uuid,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl CartLine {
    /// Saturates at `Decimal::MAX` rather than overflowing.
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// The persisted cart. `total` is always derived from `items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    /// Key of a checkout that was sent but not confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_checkout: Option<String>,
}

impl CartState {
    fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .map(CartLine::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add);
    }
}

/// What the shopper chooses on the checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutDetails {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
}

impl CheckoutDetails {
    /// Standard checkout: no tax, flat delivery charge.
    pub fn new(shipping_address: ShippingAddress, payment_method: PaymentMethod) -> Self {
        Self {
            shipping_address,
            payment_method,
            tax_price: Decimal::ZERO,
            shipping_price: DELIVERY_CHARGE,
        }
    }
}

pub struct CartStore {
    state: CartState,
    storage: Arc<dyn CartStorage>,
    order_result: Option<PlacedOrder>,
    last_error: Option<String>,
}

impl CartStore {
    /// Restores the cart from storage, or starts empty.
    pub fn open(storage: Arc<dyn CartStorage>) -> PortResult<Self> {
        let mut state = storage.load()?.unwrap_or_default();
        state.recompute_total();
        Ok(Self {
            state,
            storage,
            order_result: None,
            last_error: None,
        })
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn items(&self) -> &[CartLine] {
        &self.state.items
    }

    pub fn total(&self) -> Decimal {
        self.state.total
    }

    /// The last successful checkout, for the confirmation view.
    pub fn order_result(&self) -> Option<&PlacedOrder> {
        self.order_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Adds a line, or bumps the quantity of the existing line for the same
    /// product. A merged quantity above `MAX_CART_QUANTITY` is rejected and
    /// leaves the cart as it was.
    pub fn add(&mut self, line: CartLine) -> PortResult<()> {
        match self.state.items.iter_mut().find(|i| i.product == line.product) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .filter(|q| *q <= MAX_CART_QUANTITY)
                    .ok_or_else(|| PortError::Validation("Cart quantity is too large".to_string()))?;
            }
            None => self.state.items.push(line),
        }
        self.mutated()
    }

    pub fn remove(&mut self, product: Uuid) -> PortResult<()> {
        self.state.items.retain(|i| i.product != product);
        self.mutated()
    }

    /// Sets the quantity of a line as given, zero included.
    pub fn update_quantity(&mut self, product: Uuid, quantity: u32) -> PortResult<()> {
        if let Some(line) = self.state.items.iter_mut().find(|i| i.product == product) {
            line.quantity = quantity;
        }
        self.mutated()
    }

    pub fn clear(&mut self) -> PortResult<()> {
        self.state.items.clear();
        self.mutated()
    }

    /// The request a checkout with `details` would submit.
    pub fn checkout_request(&self, details: &CheckoutDetails) -> PlaceOrderRequest {
        let items_price = self.state.total;
        PlaceOrderRequest {
            order_items: self
                .state
                .items
                .iter()
                .map(|line| OrderItem {
                    product: line.product,
                    name: line.name.clone(),
                    quantity: line.quantity,
                    price: line.price,
                    image: line.image.clone(),
                })
                .collect(),
            shipping_address: details.shipping_address.clone(),
            payment_method: details.payment_method,
            prices: PriceBreakdown {
                items_price,
                tax_price: details.tax_price,
                shipping_price: details.shipping_price,
                total_price: items_price + details.tax_price + details.shipping_price,
            },
        }
    }

    /// Submits the cart. On success the cart is cleared and the result kept
    /// for the confirmation view; on failure the cart is left untouched and
    /// the next attempt reuses the same idempotency key.
    pub async fn checkout(
        &mut self,
        gateway: &dyn OrderGateway,
        details: &CheckoutDetails,
    ) -> PortResult<&PlacedOrder> {
        self.last_error = None;
        if self.state.items.is_empty() {
            let err = PortError::Validation("No order items".to_string());
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let request = self.checkout_request(details);
        let idempotency_key = match &self.state.pending_checkout {
            Some(key) => key.clone(),
            None => {
                let key = Uuid::new_v4().to_string();
                self.state.pending_checkout = Some(key.clone());
                if let Err(e) = self.storage.save(&self.state) {
                    warn!(error = %e, "Pending checkout key could not be persisted");
                }
                key
            }
        };
        match gateway.place_order(&request, &idempotency_key).await {
            Ok(placed) => {
                info!(order_id = %placed.order.id, "Checkout succeeded");
                self.state.items.clear();
                self.state.pending_checkout = None;
                if let Err(e) = self.commit() {
                    warn!(order_id = %placed.order.id, error = %e, "Cleared cart could not be persisted");
                }
                Ok(&*self.order_result.insert(placed))
            }
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Any edit invalidates a pending checkout: the next attempt is a new order.
    fn mutated(&mut self) -> PortResult<()> {
        self.state.pending_checkout = None;
        self.commit()
    }

    fn commit(&mut self) -> PortResult<()> {
        self.state.recompute_total();
        self.storage.save(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, STATUS_PENDING};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        saved: Mutex<Option<CartState>>,
        saves: Mutex<usize>,
        read_only: Mutex<bool>,
    }

    impl CartStorage for MemoryStorage {
        fn load(&self) -> PortResult<Option<CartState>> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, state: &CartState) -> PortResult<()> {
            if *self.read_only.lock().unwrap() {
                return Err(PortError::Unexpected("disk full".into()));
            }
            *self.saved.lock().unwrap() = Some(state.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct EchoGateway {
        /// How many calls fail before one succeeds; `usize::MAX` never succeeds.
        failures: Mutex<usize>,
        seen: Mutex<Vec<(PlaceOrderRequest, String)>>,
    }

    impl EchoGateway {
        fn new(failures: usize) -> Self {
            Self { failures: Mutex::new(failures), seen: Mutex::new(vec![]) }
        }

        fn keys(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(_, k)| k.clone()).collect()
        }
    }

    #[async_trait]
    impl OrderGateway for EchoGateway {
        async fn place_order(
            &self,
            request: &PlaceOrderRequest,
            idempotency_key: &str,
        ) -> PortResult<PlacedOrder> {
            self.seen
                .lock()
                .unwrap()
                .push((request.clone(), idempotency_key.to_string()));
            {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(PortError::Unexpected("connection reset".into()));
                }
            }
            let now = Utc::now();
            let order = Order {
                id: Uuid::new_v4(),
                user: Uuid::new_v4(),
                order_items: request.order_items.clone(),
                shipping_address: request.shipping_address.clone(),
                payment_method: request.payment_method,
                items_price: request.prices.items_price,
                tax_price: request.prices.tax_price,
                shipping_price: request.prices.shipping_price,
                total_price: request.prices.total_price,
                status: STATUS_PENDING.into(),
                is_delivered: false,
                idempotency_key: Some(idempotency_key.to_string()),
                created_at: now,
                updated_at: now,
            };
            Ok(PlacedOrder { order, qr: None })
        }
    }

    fn line(product: Uuid, price: i64, quantity: u32) -> CartLine {
        CartLine {
            product,
            name: "Neem Oil".into(),
            image: None,
            price: Decimal::new(price, 0),
            quantity,
        }
    }

    fn store() -> (CartStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        (CartStore::open(storage.clone()).unwrap(), storage)
    }

    #[test]
    fn adding_same_product_merges_quantities() {
        let (mut cart, _) = store();
        let p = Uuid::new_v4();
        cart.add(line(p, 100, 2)).unwrap();
        cart.add(line(p, 100, 3)).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), Decimal::new(500, 0));
    }

    #[test]
    fn total_tracks_every_mutation() {
        let (mut cart, storage) = store();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cart.add(line(a, 100, 2)).unwrap();
        cart.add(line(b, 35, 1)).unwrap();
        assert_eq!(cart.total(), Decimal::new(235, 0));
        cart.update_quantity(b, 4).unwrap();
        assert_eq!(cart.total(), Decimal::new(340, 0));
        cart.update_quantity(a, 0).unwrap();
        assert_eq!(cart.items().len(), 2, "zero quantity keeps the line");
        assert_eq!(cart.total(), Decimal::new(140, 0));
        cart.remove(b).unwrap();
        assert_eq!(cart.total(), Decimal::ZERO);
        cart.clear().unwrap();
        assert!(cart.items().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(*storage.saves.lock().unwrap(), 6);
        assert_eq!(storage.load().unwrap().unwrap(), *cart.state());
    }

    #[test]
    fn missing_product_edits_are_no_ops() {
        let (mut cart, _) = store();
        cart.add(line(Uuid::new_v4(), 10, 1)).unwrap();
        cart.remove(Uuid::new_v4()).unwrap();
        cart.update_quantity(Uuid::new_v4(), 9).unwrap();
        assert_eq!(cart.total(), Decimal::new(10, 0));
    }

    #[test]
    fn reopen_restores_and_recomputes() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .save(&CartState {
                items: vec![line(Uuid::new_v4(), 20, 3)],
                total: Decimal::new(1, 0),
                pending_checkout: None,
            })
            .unwrap();
        let cart = CartStore::open(storage).unwrap();
        assert_eq!(cart.total(), Decimal::new(60, 0));
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let line: CartLine = serde_json::from_str(
            r#"{"product":"0d7b0c86-8f7e-4a3b-9d43-6a8f1f2b3c4d","name":"Urea","price":266}"#,
        )
        .unwrap();
        assert_eq!(line.quantity, 1);
    }

    #[tokio::test]
    async fn successful_checkout_clears_cart_and_keeps_result() {
        let (mut cart, storage) = store();
        cart.add(line(Uuid::new_v4(), 100, 2)).unwrap();
        let gateway = EchoGateway::new(0);
        let details = CheckoutDetails::new(
            ShippingAddress { address: "Plot 7, Market Yard".into(), ..Default::default() },
            PaymentMethod::Online,
        );

        let placed = cart.checkout(&gateway, &details).await.unwrap().clone();
        assert_eq!(placed.order.total_price, Decimal::new(250, 0));
        assert!(cart.items().is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.order_result(), Some(&placed));
        assert!(storage.load().unwrap().unwrap().items.is_empty());

        let seen = gateway.seen.lock().unwrap();
        assert_eq!(seen[0].0.prices.items_price, Decimal::new(200, 0));
        assert_eq!(seen[0].0.prices.shipping_price, DELIVERY_CHARGE);
    }

    #[tokio::test]
    async fn failed_checkout_leaves_cart_untouched() {
        let (mut cart, _) = store();
        cart.add(line(Uuid::new_v4(), 100, 2)).unwrap();
        let before = cart.state().clone();
        let gateway = EchoGateway::new(usize::MAX);
        let details = CheckoutDetails::new(ShippingAddress::default(), PaymentMethod::Cod);

        assert!(cart.checkout(&gateway, &details).await.is_err());
        assert_eq!(cart.items(), before.items.as_slice());
        assert_eq!(cart.total(), before.total);
        assert!(cart.order_result().is_none());
        assert!(cart.last_error().is_some());
    }

    #[tokio::test]
    async fn empty_cart_checkout_never_reaches_the_gateway() {
        let (mut cart, _) = store();
        let gateway = EchoGateway::new(0);
        let details = CheckoutDetails::new(ShippingAddress::default(), PaymentMethod::Cod);
        let err = cart.checkout(&gateway, &details).await.unwrap_err();
        assert_eq!(err, PortError::Validation("No order items".into()));
        assert!(gateway.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retry_after_failed_checkout_reuses_the_key() {
        let (mut cart, storage) = store();
        cart.add(line(Uuid::new_v4(), 100, 2)).unwrap();
        let gateway = EchoGateway::new(1);
        let details = CheckoutDetails::new(ShippingAddress::default(), PaymentMethod::Online);

        assert!(cart.checkout(&gateway, &details).await.is_err());
        let pending = storage.load().unwrap().unwrap().pending_checkout;
        assert!(pending.is_some(), "key survives a restart");

        cart.checkout(&gateway, &details).await.unwrap();
        let keys = gateway.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
        assert_eq!(pending.as_deref(), Some(keys[0].as_str()));
        assert!(cart.state().pending_checkout.is_none());
    }

    #[tokio::test]
    async fn editing_the_cart_starts_a_new_checkout() {
        let (mut cart, _) = store();
        let p = Uuid::new_v4();
        cart.add(line(p, 100, 1)).unwrap();
        let gateway = EchoGateway::new(1);
        let details = CheckoutDetails::new(ShippingAddress::default(), PaymentMethod::Cod);

        assert!(cart.checkout(&gateway, &details).await.is_err());
        cart.update_quantity(p, 3).unwrap();
        cart.checkout(&gateway, &details).await.unwrap();
        let keys = gateway.keys();
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn placed_order_is_kept_when_the_cleared_cart_cannot_be_saved() {
        let (mut cart, storage) = store();
        cart.add(line(Uuid::new_v4(), 100, 2)).unwrap();
        *storage.read_only.lock().unwrap() = true;
        let gateway = EchoGateway::new(0);
        let details = CheckoutDetails::new(ShippingAddress::default(), PaymentMethod::Cod);

        let placed = cart.checkout(&gateway, &details).await.unwrap().clone();
        assert_eq!(cart.order_result(), Some(&placed));
        assert!(cart.items().is_empty());
    }

    #[test]
    fn oversized_quantities_are_rejected_without_panicking() {
        let (mut cart, _) = store();
        let p = Uuid::new_v4();
        cart.add(line(p, 100, MAX_CART_QUANTITY)).unwrap();
        let err = cart.add(line(p, 100, 1)).unwrap_err();
        assert_eq!(err, PortError::Validation("Cart quantity is too large".into()));
        assert_eq!(cart.items()[0].quantity, MAX_CART_QUANTITY);

        let huge = CartLine { price: Decimal::MAX, ..line(Uuid::new_v4(), 0, u32::MAX) };
        assert_eq!(huge.line_total(), Decimal::MAX);
        cart.update_quantity(p, u32::MAX).unwrap();
        cart.add(huge).unwrap();
        assert_eq!(cart.total(), Decimal::MAX);
    }
}
