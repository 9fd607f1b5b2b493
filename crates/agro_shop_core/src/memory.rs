//! crates/agro_shop_core/src/memory.rs
//!
//! An in-process `DatabaseService`. Everything lives behind one mutex, so
//! each call (and `place_order` in particular) is atomic. Used by the test
//! suites and by the API's `STORAGE_BACKEND=memory` mode.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AuthSession, Category, NewOrder, NewProduct, NewSuccessStory, NewUser, Order, OrderTotals,
    Product, ProductFilter, SuccessStory, User, UserCredentials, STATUS_PENDING,
};
use crate::ports::{DatabaseService, PortError, PortResult};

struct StoredUser {
    user: User,
    hashed_password: String,
    reset_token: Option<(String, DateTime<Utc>)>,
}

#[derive(Default)]
struct State {
    users: Vec<StoredUser>,
    sessions: HashMap<String, AuthSession>,
    products: Vec<Product>,
    categories: Vec<Category>,
    orders: Vec<Order>,
    stories: Vec<SuccessStory>,
}

impl State {
    fn user_mut(&mut self, user_id: Uuid) -> PortResult<&mut StoredUser> {
        self.users
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.user.email.eq_ignore_ascii_case(email) && Some(u.user.id) != except)
    }
}

#[derive(Default)]
pub struct InMemoryDatabase {
    state: Mutex<State>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut state = self.state.lock().await;
        if state.email_taken(&new_user.email, None) {
            return Err(PortError::Conflict("User already exists".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            is_admin: new_user.is_admin,
            is_suspended: false,
            city_or_village: new_user.city_or_village,
            contact_number: new_user.contact_number,
            address: None,
            cart: Vec::new(),
            wishlist: Vec::new(),
            orders: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(StoredUser {
            user: user.clone(),
            hashed_password: new_user.hashed_password,
            reset_token: None,
        });
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let mut state = self.state.lock().await;
        Ok(state.user_mut(user_id)?.user.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| u.user.email.eq_ignore_ascii_case(email))
            .map(|u| UserCredentials {
                user: u.user.clone(),
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User with email {email} not found")))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().map(|u| u.user.clone()).collect())
    }

    async fn save_user(&self, user: &User) -> PortResult<User> {
        let mut state = self.state.lock().await;
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(PortError::Conflict("Email is already in use".to_string()));
        }
        let stored = state.user_mut(user.id)?;
        stored.user = user.clone();
        Ok(stored.user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.user.id != user_id);
        if state.users.len() == before {
            return Err(PortError::NotFound(format!("User {user_id} not found")));
        }
        state.sessions.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn set_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let stored = state.user_mut(user_id)?;
        stored.hashed_password = hashed_password.to_string();
        stored.reset_token = None;
        stored.user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_password_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state.user_mut(user_id)?.reset_token = Some((token.to_string(), expires_at));
        Ok(())
    }

    async fn get_user_by_reset_token(&self, token: &str, now: DateTime<Utc>) -> PortResult<User> {
        let state = self.state.lock().await;
        state
            .users
            .iter()
            .find(|u| matches!(&u.reset_token, Some((t, exp)) if t == token && *exp > now))
            .map(|u| u.user.clone())
            .ok_or_else(|| {
                PortError::Validation("Invalid or expired token".to_string())
            })
    }

    async fn count_users(&self) -> PortResult<u64> {
        Ok(self.state.lock().await.users.len() as u64)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state.sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state.lock().await;
        match state.sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.state.lock().await.sessions.remove(session_id);
        Ok(())
    }

    async fn list_products(&self, filter: &ProductFilter) -> PortResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn get_product(&self, product_id: Uuid) -> PortResult<Product> {
        let state = self.state.lock().await;
        state
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Product {product_id} not found")))
    }

    async fn create_product(&self, new_product: NewProduct) -> PortResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: new_product.name,
            description: new_product.description,
            price: new_product.price,
            category: new_product.category,
            images: new_product.images,
            stock: new_product.stock,
            rating: new_product.rating,
            num_reviews: 0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.products.push(product.clone());
        Ok(product)
    }

    async fn save_product(&self, product: &Product) -> PortResult<Product> {
        let mut state = self.state.lock().await;
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| PortError::NotFound(format!("Product {} not found", product.id)))?;
        *slot = product.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete_product(&self, product_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != product_id);
        if state.products.len() == before {
            return Err(PortError::NotFound(format!("Product {product_id} not found")));
        }
        Ok(())
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        Ok(self.state.lock().await.categories.clone())
    }

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category> {
        let state = self.state.lock().await;
        state
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Category {category_id} not found")))
    }

    async fn find_category_by_name(&self, name: &str) -> PortResult<Option<Category>> {
        let state = self.state.lock().await;
        Ok(state.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> PortResult<Category> {
        let mut state = self.state.lock().await;
        if state.categories.iter().any(|c| c.name == name) {
            return Err(PortError::Conflict("Category already exists".to_string()));
        }
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn save_category(&self, category: &Category) -> PortResult<Category> {
        let mut state = self.state.lock().await;
        if state
            .categories
            .iter()
            .any(|c| c.name == category.name && c.id != category.id)
        {
            return Err(PortError::Conflict("Category already exists".to_string()));
        }
        let slot = state
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| PortError::NotFound(format!("Category {} not found", category.id)))?;
        *slot = category.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let before = state.categories.len();
        state.categories.retain(|c| c.id != category_id);
        if state.categories.len() == before {
            return Err(PortError::NotFound(format!("Category {category_id} not found")));
        }
        Ok(())
    }

    async fn place_order(&self, new_order: NewOrder) -> PortResult<Order> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user: new_order.user,
            order_items: new_order.order_items,
            shipping_address: new_order.shipping_address,
            payment_method: new_order.payment_method,
            items_price: new_order.prices.items_price,
            tax_price: new_order.prices.tax_price,
            shipping_price: new_order.prices.shipping_price,
            total_price: new_order.prices.total_price,
            status: STATUS_PENDING.to_string(),
            is_delivered: false,
            idempotency_key: new_order.idempotency_key,
            created_at: now,
            updated_at: now,
        };

        // Owner first: a missing owner must leave nothing behind.
        let owner = state.user_mut(order.user)?;
        owner.user.orders.push(order.id);
        owner.user.cart.clear();
        owner.user.updated_at = now;
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order_by_idempotency_key(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> PortResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.user == user_id && o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn get_order(&self, order_id: Uuid) -> PortResult<Order> {
        let state = self.state.lock().await;
        state
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Order {order_id} not found")))
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> PortResult<Vec<Order>> {
        let state = self.state.lock().await;
        let mine: Vec<Order> = state.orders.iter().filter(|o| o.user == user_id).cloned().collect();
        Ok(newest_first(mine, |o| o.created_at))
    }

    async fn list_orders(&self) -> PortResult<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(newest_first(state.orders.clone(), |o| o.created_at))
    }

    async fn save_order(&self, order: &Order) -> PortResult<Order> {
        let mut state = self.state.lock().await;
        let slot = state
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order.id)))?;
        *slot = order.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn order_totals(&self) -> PortResult<OrderTotals> {
        let state = self.state.lock().await;
        Ok(OrderTotals {
            total_orders: state.orders.len() as u64,
            total_sales: state.orders.iter().map(|o| o.total_price).sum::<Decimal>(),
        })
    }

    async fn create_story(&self, new_story: NewSuccessStory) -> PortResult<SuccessStory> {
        let now = Utc::now();
        let story = SuccessStory {
            id: Uuid::new_v4(),
            name: new_story.name,
            location: new_story.location,
            crop: new_story.crop,
            yield_increase: new_story.yield_increase,
            profit_increase: new_story.profit_increase,
            time_saved: new_story.time_saved,
            testimonial: new_story.testimonial,
            products_used: new_story.products_used,
            is_approved: false,
            submitted_at: now,
            approved_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.stories.push(story.clone());
        Ok(story)
    }

    async fn list_stories(
        &self,
        approved_only: bool,
        limit: Option<usize>,
    ) -> PortResult<Vec<SuccessStory>> {
        let state = self.state.lock().await;
        let mut stories = if approved_only {
            let approved: Vec<SuccessStory> = state.stories.iter().filter(|s| s.is_approved).cloned().collect();
            newest_first(approved, |s| s.approved_at.unwrap_or(s.created_at))
        } else {
            newest_first(state.stories.clone(), |s| s.created_at)
        };
        if let Some(limit) = limit {
            stories.truncate(limit);
        }
        Ok(stories)
    }

    async fn get_story(&self, story_id: Uuid) -> PortResult<SuccessStory> {
        let state = self.state.lock().await;
        state
            .stories
            .iter()
            .find(|s| s.id == story_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Story {story_id} not found")))
    }

    async fn save_story(&self, story: &SuccessStory) -> PortResult<SuccessStory> {
        let mut state = self.state.lock().await;
        let slot = state
            .stories
            .iter_mut()
            .find(|s| s.id == story.id)
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story.id)))?;
        *slot = story.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete_story(&self, story_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let before = state.stories.len();
        state.stories.retain(|s| s.id != story_id);
        if state.stories.len() == before {
            return Err(PortError::NotFound(format!("Story {story_id} not found")));
        }
        Ok(())
    }
}
