//! crates/agro_shop_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the storefront's core logic.
//! These traits form the boundary of the hexagonal architecture: the order
//! service, the cart state holder and the web layer only ever talk to these,
//! so the database, mail transport, payment-reference generator and checkout
//! transport can all be swapped for fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cart::CartState;
use crate::domain::{
    Category, NewOrder, NewProduct, NewSuccessStory, NewUser, Order, OrderTotals, Product,
    ProductFilter, SuccessStory, User, UserCredentials,
};
use crate::notify::Notification;
use crate::orders::{PlaceOrderRequest, PlacedOrder};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    NotFound(String),
    /// A uniqueness rule was violated (duplicate email, category name, ...).
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn list_users(&self) -> PortResult<Vec<User>>;

    /// Overwrites the stored document with `user` (last write wins).
    async fn save_user(&self, user: &User) -> PortResult<User>;

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    /// Stores a new password hash and drops any pending reset token.
    async fn set_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    async fn set_password_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Finds the user holding `token`, provided it has not expired at `now`.
    async fn get_user_by_reset_token(&self, token: &str, now: DateTime<Utc>) -> PortResult<User>;

    async fn count_users(&self) -> PortResult<u64>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Catalog ---
    async fn list_products(&self, filter: &ProductFilter) -> PortResult<Vec<Product>>;

    async fn get_product(&self, product_id: Uuid) -> PortResult<Product>;

    async fn create_product(&self, new_product: NewProduct) -> PortResult<Product>;

    async fn save_product(&self, product: &Product) -> PortResult<Product>;

    async fn delete_product(&self, product_id: Uuid) -> PortResult<()>;

    async fn list_categories(&self) -> PortResult<Vec<Category>>;

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category>;

    async fn find_category_by_name(&self, name: &str) -> PortResult<Option<Category>>;

    async fn create_category(&self, name: &str, description: Option<&str>) -> PortResult<Category>;

    async fn save_category(&self, category: &Category) -> PortResult<Category>;

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()>;

    // --- Orders ---
    /// Creates the order, appends its id to the owner's order list and clears
    /// the owner's cart as one atomic unit. Either all three happen or none.
    async fn place_order(&self, new_order: NewOrder) -> PortResult<Order>;

    async fn find_order_by_idempotency_key(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> PortResult<Option<Order>>;

    async fn get_order(&self, order_id: Uuid) -> PortResult<Order>;

    async fn list_orders_for_user(&self, user_id: Uuid) -> PortResult<Vec<Order>>;

    async fn list_orders(&self) -> PortResult<Vec<Order>>;

    async fn save_order(&self, order: &Order) -> PortResult<Order>;

    async fn order_totals(&self) -> PortResult<OrderTotals>;

    // --- Success Stories ---
    async fn create_story(&self, new_story: NewSuccessStory) -> PortResult<SuccessStory>;

    /// Approved stories come back newest approval first, everything else
    /// newest submission first.
    async fn list_stories(
        &self,
        approved_only: bool,
        limit: Option<usize>,
    ) -> PortResult<Vec<SuccessStory>>;

    async fn get_story(&self, story_id: Uuid) -> PortResult<SuccessStory>;

    async fn save_story(&self, story: &SuccessStory) -> PortResult<SuccessStory>;

    async fn delete_story(&self, story_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Delivers one message. Callers treat failures as best-effort.
    async fn send(&self, notification: &Notification) -> PortResult<()>;
}

pub trait PaymentReferenceService: Send + Sync {
    /// Builds an opaque payment reference (a QR image URL) for an order.
    fn payment_reference(
        &self,
        order_id: Uuid,
        amount: Decimal,
        payer_email: &str,
    ) -> PortResult<String>;
}

/// The client's view of the order service.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submits a checkout. `idempotency_key` is stable across retries of the
    /// same attempt.
    async fn place_order(
        &self,
        request: &PlaceOrderRequest,
        idempotency_key: &str,
    ) -> PortResult<PlacedOrder>;
}

/// Durable storage for the client cart (browser local storage, a file, ...).
pub trait CartStorage: Send + Sync {
    fn load(&self) -> PortResult<Option<CartState>>;

    fn save(&self, state: &CartState) -> PortResult<()>;
}
