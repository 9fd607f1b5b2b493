//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use agro_shop_core::domain::{
    CartEntry, Category, NewOrder, NewProduct, NewSuccessStory, NewUser, Order, OrderItem,
    OrderTotals, PaymentMethod, Product, ProductFilter, ProductTag, Review, ShippingAddress,
    SuccessStory, User, UserCredentials, STATUS_PENDING,
};
use agro_shop_core::ports::{DatabaseService, PortError, PortResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: &'static str) -> impl Fn(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{what} not found")),
        other => PortError::Unexpected(other.to_string()),
    }
}

fn conflict_or_unexpected(message: &'static str) -> impl Fn(sqlx::Error) -> PortError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(message.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn ensure_affected(rows: u64, what: &'static str) -> PortResult<()> {
    if rows == 0 {
        return Err(PortError::NotFound(format!("{what} not found")));
    }
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, first_name, last_name, email, hashed_password, is_admin, \
     is_suspended, city_or_village, contact_number, address, cart, wishlist, orders, \
     created_at, updated_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    hashed_password: String,
    is_admin: bool,
    is_suspended: bool,
    city_or_village: Option<String>,
    contact_number: Option<String>,
    address: Option<String>,
    cart: Json<Vec<CartEntry>>,
    wishlist: Vec<Uuid>,
    orders: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            hashed_password: self.hashed_password,
            user: User {
                id: self.id,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                is_admin: self.is_admin,
                is_suspended: self.is_suspended,
                city_or_village: self.city_or_village,
                contact_number: self.contact_number,
                address: self.address,
                cart: self.cart.0,
                wishlist: self.wishlist,
                orders: self.orders,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }

    fn to_domain(self) -> User {
        self.to_credentials().user
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, images, stock, rating, \
     num_reviews, reviews, created_at, updated_at";

#[derive(FromRow)]
struct ProductRecord {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    category: Uuid,
    images: Vec<String>,
    stock: i32,
    rating: f64,
    num_reviews: i32,
    reviews: Json<Vec<Review>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ProductRecord {
    fn to_domain(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            images: self.images,
            stock: self.stock,
            rating: self.rating,
            num_reviews: self.num_reviews.max(0) as u32,
            reviews: self.reviews.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, order_items, shipping_address, payment_method, \
     items_price, tax_price, shipping_price, total_price, status, is_delivered, \
     idempotency_key, created_at, updated_at";

#[derive(FromRow)]
struct OrderRecord {
    id: Uuid,
    user_id: Uuid,
    order_items: Json<Vec<OrderItem>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    items_price: Decimal,
    tax_price: Decimal,
    shipping_price: Decimal,
    total_price: Decimal,
    status: String,
    is_delivered: bool,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl OrderRecord {
    fn to_domain(self) -> PortResult<Order> {
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(PortError::Unexpected)?;
        Ok(Order {
            id: self.id,
            user: self.user_id,
            order_items: self.order_items.0,
            shipping_address: self.shipping_address.0,
            payment_method,
            items_price: self.items_price,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            status: self.status,
            is_delivered: self.is_delivered,
            idempotency_key: self.idempotency_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const STORY_COLUMNS: &str = "id, name, location, crop, yield_increase, profit_increase, \
     time_saved, testimonial, products_used, is_approved, submitted_at, approved_at, \
     approved_by, created_at, updated_at";

#[derive(FromRow)]
struct StoryRecord {
    id: Uuid,
    name: String,
    location: String,
    crop: String,
    yield_increase: f64,
    profit_increase: f64,
    time_saved: f64,
    testimonial: String,
    products_used: Vec<String>,
    is_approved: bool,
    submitted_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StoryRecord {
    fn to_domain(self) -> PortResult<SuccessStory> {
        let products_used = self
            .products_used
            .iter()
            .map(|tag| tag.parse::<ProductTag>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(PortError::Unexpected)?;
        Ok(SuccessStory {
            id: self.id,
            name: self.name,
            location: self.location,
            crop: self.crop,
            yield_increase: self.yield_increase,
            profit_increase: self.profit_increase,
            time_saved: self.time_saved,
            testimonial: self.testimonial,
            products_used,
            is_approved: self.is_approved,
            submitted_at: self.submitted_at,
            approved_at: self.approved_at,
            approved_by: self.approved_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn tag_names(tags: &[ProductTag]) -> Vec<String> {
    tags.iter().map(|t| t.as_str().to_string()).collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users ---

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, first_name, last_name, email, hashed_password, is_admin, \
             city_or_village, contact_number) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .bind(new_user.is_admin)
            .bind(&new_user.city_or_village)
            .bind(&new_user.contact_number)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_or_unexpected("User already exists"))?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("User"))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("User"))?;
        Ok(record.to_credentials())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn save_user(&self, user: &User) -> PortResult<User> {
        let sql = format!(
            "UPDATE users SET first_name = $2, last_name = $3, email = $4, is_admin = $5, \
             is_suspended = $6, city_or_village = $7, contact_number = $8, address = $9, \
             cart = $10, wishlist = $11, orders = $12, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user.id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(user.is_admin)
            .bind(user.is_suspended)
            .bind(&user.city_or_village)
            .bind(&user.contact_number)
            .bind(&user.address)
            .bind(Json(&user.cart))
            .bind(&user.wishlist)
            .bind(&user.orders)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound("User not found".to_string()),
                other => conflict_or_unexpected("Email is already in use")(other),
            })?;
        Ok(record.to_domain())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        ensure_affected(result.rows_affected(), "User")
    }

    async fn set_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET hashed_password = $2, reset_token = NULL, \
             reset_token_expires_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(hashed_password)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        ensure_affected(result.rows_affected(), "User")
    }

    async fn set_password_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        ensure_affected(result.rows_affected(), "User")
    }

    async fn get_user_by_reset_token(&self, token: &str, now: DateTime<Utc>) -> PortResult<User> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1 AND reset_token_expires_at > $2"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| {
                PortError::Validation("Invalid or expired token".to_string())
            })?;
        Ok(record.to_domain())
    }

    async fn count_users(&self) -> PortResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Catalog ---

    async fn list_products(&self, filter: &ProductFilter) -> PortResult<Vec<Product>> {
        let search = filter.search.as_deref().filter(|s| !s.is_empty());
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::uuid IS NULL OR category = $1) \
             AND ($2::text IS NULL OR POSITION(LOWER($2) IN LOWER(name)) > 0) \
             ORDER BY created_at"
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(filter.category)
            .bind(search)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(ProductRecord::to_domain).collect())
    }

    async fn get_product(&self, product_id: Uuid) -> PortResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Product"))?;
        Ok(record.to_domain())
    }

    async fn create_product(&self, new_product: NewProduct) -> PortResult<Product> {
        let sql = format!(
            "INSERT INTO products (id, name, description, price, category, images, stock, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PRODUCT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_product.name)
            .bind(&new_product.description)
            .bind(new_product.price)
            .bind(new_product.category)
            .bind(&new_product.images)
            .bind(new_product.stock)
            .bind(new_product.rating)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn save_product(&self, product: &Product) -> PortResult<Product> {
        let sql = format!(
            "UPDATE products SET name = $2, description = $3, price = $4, category = $5, \
             images = $6, stock = $7, rating = $8, num_reviews = $9, reviews = $10, \
             updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.category)
            .bind(&product.images)
            .bind(product.stock)
            .bind(product.rating)
            .bind(product.num_reviews as i32)
            .bind(Json(&product.reviews))
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Product"))?;
        Ok(record.to_domain())
    }

    async fn delete_product(&self, product_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        ensure_affected(result.rows_affected(), "Product")
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, description, created_at, updated_at FROM categories ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(CategoryRecord::to_domain).collect())
    }

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, description, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected("Category"))?;
        Ok(record.to_domain())
    }

    async fn find_category_by_name(&self, name: &str) -> PortResult<Option<Category>> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, name, description, created_at, updated_at FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(CategoryRecord::to_domain))
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_unexpected("Category already exists"))?;
        Ok(record.to_domain())
    }

    async fn save_category(&self, category: &Category) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "UPDATE categories SET name = $2, description = $3, updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Category not found".to_string()),
            other => conflict_or_unexpected("Category already exists")(other),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        ensure_affected(result.rows_affected(), "Category")
    }

    // --- Orders ---

    async fn place_order(&self, new_order: NewOrder) -> PortResult<Order> {
        let order_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Owner first: a missing owner rolls back before anything is written.
        let linked = sqlx::query(
            "UPDATE users SET orders = array_append(orders, $1), cart = '[]'::jsonb, \
             updated_at = NOW() WHERE id = $2",
        )
        .bind(order_id)
        .bind(new_order.user)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;
        ensure_affected(linked.rows_affected(), "User")?;

        let sql = format!(
            "INSERT INTO orders (id, user_id, order_items, shipping_address, payment_method, \
             items_price, tax_price, shipping_price, total_price, status, idempotency_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {ORDER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(order_id)
            .bind(new_order.user)
            .bind(Json(&new_order.order_items))
            .bind(Json(&new_order.shipping_address))
            .bind(new_order.payment_method.to_string())
            .bind(new_order.prices.items_price)
            .bind(new_order.prices.tax_price)
            .bind(new_order.prices.shipping_price)
            .bind(new_order.prices.total_price)
            .bind(STATUS_PENDING)
            .bind(&new_order.idempotency_key)
            .fetch_one(&mut *tx)
            .await
            .map_err(conflict_or_unexpected("Order already placed"))?;

        tx.commit().await.map_err(unexpected)?;
        record.to_domain()
    }

    async fn find_order_by_idempotency_key(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> PortResult<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND idempotency_key = $2"
        );
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(user_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(OrderRecord::to_domain)
            .transpose()
    }

    async fn get_order(&self, order_id: Uuid) -> PortResult<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(order_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Order"))?
            .to_domain()
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> PortResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(OrderRecord::to_domain)
            .collect()
    }

    async fn list_orders(&self) -> PortResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC");
        sqlx::query_as::<_, OrderRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(OrderRecord::to_domain)
            .collect()
    }

    async fn save_order(&self, order: &Order) -> PortResult<Order> {
        let sql = format!(
            "UPDATE orders SET status = $2, is_delivered = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(order.id)
            .bind(&order.status)
            .bind(order.is_delivered)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Order"))?
            .to_domain()
    }

    async fn order_totals(&self) -> PortResult<OrderTotals> {
        let (total_orders, total_sales): (i64, Decimal) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_price), 0) FROM orders")
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(OrderTotals {
            total_orders: total_orders.max(0) as u64,
            total_sales,
        })
    }

    // --- Success Stories ---

    async fn create_story(&self, new_story: NewSuccessStory) -> PortResult<SuccessStory> {
        let sql = format!(
            "INSERT INTO success_stories (id, name, location, crop, yield_increase, \
             profit_increase, time_saved, testimonial, products_used) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {STORY_COLUMNS}"
        );
        sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_story.name)
            .bind(&new_story.location)
            .bind(&new_story.crop)
            .bind(new_story.yield_increase)
            .bind(new_story.profit_increase)
            .bind(new_story.time_saved)
            .bind(&new_story.testimonial)
            .bind(tag_names(&new_story.products_used))
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn list_stories(
        &self,
        approved_only: bool,
        limit: Option<usize>,
    ) -> PortResult<Vec<SuccessStory>> {
        let sql = if approved_only {
            format!(
                "SELECT {STORY_COLUMNS} FROM success_stories WHERE is_approved \
                 ORDER BY approved_at DESC LIMIT $1"
            )
        } else {
            format!("SELECT {STORY_COLUMNS} FROM success_stories ORDER BY created_at DESC LIMIT $1")
        };
        sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(StoryRecord::to_domain)
            .collect()
    }

    async fn get_story(&self, story_id: Uuid) -> PortResult<SuccessStory> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM success_stories WHERE id = $1");
        sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(story_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Story"))?
            .to_domain()
    }

    async fn save_story(&self, story: &SuccessStory) -> PortResult<SuccessStory> {
        let sql = format!(
            "UPDATE success_stories SET name = $2, location = $3, crop = $4, \
             yield_increase = $5, profit_increase = $6, time_saved = $7, testimonial = $8, \
             products_used = $9, is_approved = $10, approved_at = $11, approved_by = $12, \
             updated_at = NOW() WHERE id = $1 RETURNING {STORY_COLUMNS}"
        );
        sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(story.id)
            .bind(&story.name)
            .bind(&story.location)
            .bind(&story.crop)
            .bind(story.yield_increase)
            .bind(story.profit_increase)
            .bind(story.time_saved)
            .bind(&story.testimonial)
            .bind(tag_names(&story.products_used))
            .bind(story.is_approved)
            .bind(story.approved_at)
            .bind(story.approved_by)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Story"))?
            .to_domain()
    }

    async fn delete_story(&self, story_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM success_stories WHERE id = $1")
            .bind(story_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        ensure_affected(result.rows_affected(), "Story")
    }
}
