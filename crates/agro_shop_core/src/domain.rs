//! crates/agro_shop_core/src/domain.rs
//!
//! Defines the core data structures for the storefront.
//! These structs carry serde derives because they travel as JSON over the API
//! and are embedded as JSON documents by the storage adapters, but they know
//! nothing about any particular database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// Upper bound on the quantity of one product in a cart.
pub const MAX_CART_QUANTITY: u32 = 10_000;

/// The status string that marks an order as delivered.
pub const STATUS_DELIVERED: &str = "Delivered";

/// The status every order starts in.
pub const STATUS_PENDING: &str = "Pending";

//=========================================================================================
// Users
//=========================================================================================

/// A registered account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_suspended: bool,
    pub city_or_village: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub cart: Vec<CartEntry>,
    pub wishlist: Vec<Uuid>,
    pub orders: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last", used as the author snapshot on reviews and in order lookups.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Adds `quantity` of a product to the server-side cart, merging with an
    /// existing entry for the same product. The merged quantity may not
    /// exceed `MAX_CART_QUANTITY`.
    pub fn add_to_cart(&mut self, product: Uuid, quantity: u32) -> PortResult<()> {
        let existing = self.cart.iter_mut().find(|entry| entry.product == product);
        let current = existing.as_ref().map_or(0, |entry| entry.quantity);
        let merged = current
            .checked_add(quantity)
            .filter(|q| *q <= MAX_CART_QUANTITY)
            .ok_or_else(|| PortError::Validation("Cart quantity is too large".to_string()))?;
        match existing {
            Some(entry) => entry.quantity = merged,
            None => self.cart.push(CartEntry { product, quantity: merged }),
        }
        Ok(())
    }

    pub fn remove_from_cart(&mut self, product: Uuid) {
        self.cart.retain(|entry| entry.product != product);
    }

    /// Appends to the wishlist unless the product is already on it.
    pub fn add_to_wishlist(&mut self, product: Uuid) {
        if !self.wishlist.contains(&product) {
            self.wishlist.push(product);
        }
    }

    pub fn remove_from_wishlist(&mut self, product: Uuid) {
        self.wishlist.retain(|p| *p != product);
    }
}

/// One line of the server-side cart embedded in a `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product: Uuid,
    pub quantity: u32,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

/// Everything needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub city_or_village: Option<String>,
    pub contact_number: Option<String>,
}

// Represents a bearer-token login session
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Uuid,
    pub images: Vec<String>,
    pub stock: i32,
    pub rating: f64,
    pub num_reviews: u32,
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review embedded in its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: Uuid,
    pub name: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Uuid,
    pub images: Vec<String>,
    pub stock: i32,
    pub rating: f64,
}

/// Query options for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<Uuid>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(term) if !term.is_empty() => product
                .name
                .to_lowercase()
                .contains(&term.to_lowercase()),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Orders
//=========================================================================================

/// A point-in-time copy of a purchased product. Never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Uuid,
    pub name: String,
    #[serde(alias = "qty")]
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Online,
    #[serde(rename = "COD")]
    Cod,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "Online"),
            Self::Cod => write!(f, "COD"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(Self::Online),
            "COD" => Ok(Self::Cod),
            other => Err(format!("unknown payment method '{}'", other)),
        }
    }
}

/// Caller-computed prices. `total_price` is stored exactly as supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: Uuid,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub status: String,
    pub is_delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Overwrites the status. A blank status keeps the current one, and
    /// reaching "Delivered" latches `is_delivered`; nothing ever clears it.
    pub fn apply_status(&mut self, status: &str) {
        let status = status.trim();
        if !status.is_empty() {
            self.status = status.to_string();
        }
        if self.status == STATUS_DELIVERED {
            self.is_delivered = true;
        }
    }
}

/// The write issued when a checkout is accepted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user: Uuid,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub prices: PriceBreakdown,
    pub idempotency_key: Option<String>,
}

/// The name and email of an order's owner, shown on single-order lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOwner {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for OrderOwner {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithOwner {
    #[serde(flatten)]
    pub order: Order,
    /// `None` when the owning account has since been deleted.
    pub owner: Option<OrderOwner>,
}

/// Aggregate figures for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub total_orders: u64,
    pub total_sales: Decimal,
}

//=========================================================================================
// Success stories
//=========================================================================================

/// The closed set of product categories a farmer can tag a story with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductTag {
    Seeds,
    Fertilizers,
    Sprayers,
    Pesticides,
}

impl ProductTag {
    pub const ALL: [ProductTag; 4] = [
        ProductTag::Seeds,
        ProductTag::Fertilizers,
        ProductTag::Sprayers,
        ProductTag::Pesticides,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeds => "Seeds",
            Self::Fertilizers => "Fertilizers",
            Self::Sprayers => "Sprayers",
            Self::Pesticides => "Pesticides",
        }
    }
}

impl FromStr for ProductTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown product tag '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessStory {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub crop: String,
    pub yield_increase: f64,
    pub profit_increase: f64,
    pub time_saved: f64,
    pub testimonial: String,
    pub products_used: Vec<ProductTag>,
    pub is_approved: bool,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SuccessStory {
    pub fn approve(&mut self, moderator: Uuid, at: DateTime<Utc>) {
        self.is_approved = true;
        self.approved_at = Some(at);
        self.approved_by = Some(moderator);
    }

    /// Rejection clears every moderation field; the story stays stored.
    pub fn reject(&mut self) {
        self.is_approved = false;
        self.approved_at = None;
        self.approved_by = None;
    }
}

#[derive(Debug, Clone)]
pub struct NewSuccessStory {
    pub name: String,
    pub location: String,
    pub crop: String,
    pub yield_increase: f64,
    pub profit_increase: f64,
    pub time_saved: f64,
    pub testimonial: String,
    pub products_used: Vec<ProductTag>,
}
