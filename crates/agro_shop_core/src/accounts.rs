//! crates/agro_shop_core/src/accounts.rs
//!
//! Account moderation (admin) and the self-service edits a user makes to
//! their own document: profile, server-side cart and wishlist.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::User;
use crate::locks::UserLocks;
use crate::ports::{DatabaseService, PortError, PortResult};

/// Admin edit of another account. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

/// A user's edit of their own profile. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub city_or_village: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    /// Already hashed by the caller.
    pub hashed_password: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<dyn DatabaseService>,
    locks: UserLocks,
}

impl AccountService {
    pub fn new(db: Arc<dyn DatabaseService>, locks: UserLocks) -> Self {
        Self { db, locks }
    }

    async fn load(&self, user_id: Uuid) -> PortResult<User> {
        self.db.get_user(user_id).await.map_err(|e| match e {
            PortError::NotFound(_) => PortError::NotFound("User not found".to_string()),
            other => other,
        })
    }

    // --- Moderation ---

    /// Deletes `target_id` on behalf of `actor`. Admins cannot delete
    /// themselves or another admin.
    pub async fn delete_user(&self, actor: &User, target_id: Uuid) -> PortResult<()> {
        if actor.id == target_id {
            return Err(PortError::Validation(
                "You cannot delete your own admin account.".to_string(),
            ));
        }
        let _guard = self.locks.lock(target_id).await;
        let target = self.load(target_id).await?;
        if target.is_admin {
            return Err(PortError::Forbidden("You cannot delete another admin.".to_string()));
        }
        self.db.delete_user(target_id).await?;
        info!(actor = %actor.id, target = %target_id, "User deleted");
        Ok(())
    }

    /// Flips the suspension flag and returns the updated user.
    pub async fn toggle_suspension(&self, target_id: Uuid) -> PortResult<User> {
        let _guard = self.locks.lock(target_id).await;
        let mut user = self.load(target_id).await?;
        user.is_suspended = !user.is_suspended;
        user.updated_at = Utc::now();
        let user = self.db.save_user(&user).await?;
        info!(target = %target_id, suspended = user.is_suspended, "User suspension toggled");
        Ok(user)
    }

    pub async fn force_password(&self, target_id: Uuid, hashed_password: &str) -> PortResult<()> {
        self.load(target_id).await?;
        self.db.set_password(target_id, hashed_password).await?;
        info!(target = %target_id, "Password reset by admin");
        Ok(())
    }

    pub async fn admin_update(&self, target_id: Uuid, update: AdminUserUpdate) -> PortResult<User> {
        let _guard = self.locks.lock(target_id).await;
        let mut user = self.load(target_id).await?;
        if let Some(first_name) = non_blank(update.first_name) {
            user.first_name = first_name;
        }
        if let Some(last_name) = non_blank(update.last_name) {
            user.last_name = last_name;
        }
        if let Some(email) = non_blank(update.email) {
            user.email = email;
        }
        if let Some(is_admin) = update.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = Utc::now();
        self.db.save_user(&user).await
    }

    // --- Self-service ---

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User> {
        let _guard = self.locks.lock(user_id).await;
        let mut user = self.load(user_id).await?;
        if let Some(first_name) = non_blank(update.first_name) {
            user.first_name = first_name;
        }
        if let Some(last_name) = non_blank(update.last_name) {
            user.last_name = last_name;
        }
        if let Some(email) = non_blank(update.email) {
            user.email = email;
        }
        if update.city_or_village.is_some() {
            user.city_or_village = update.city_or_village;
        }
        if update.contact_number.is_some() {
            user.contact_number = update.contact_number;
        }
        if update.address.is_some() {
            user.address = update.address;
        }
        user.updated_at = Utc::now();
        let user = self.db.save_user(&user).await?;
        if let Some(hash) = update.hashed_password {
            self.db.set_password(user_id, &hash).await?;
        }
        Ok(user)
    }

    pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: u32) -> PortResult<User> {
        self.mutate(user_id, |user| user.add_to_cart(product_id, quantity)).await
    }

    pub async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> PortResult<User> {
        self.mutate(user_id, |user| {
            user.remove_from_cart(product_id);
            Ok(())
        })
        .await
    }

    pub async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> PortResult<User> {
        self.mutate(user_id, |user| {
            user.add_to_wishlist(product_id);
            Ok(())
        })
        .await
    }

    pub async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> PortResult<User> {
        self.mutate(user_id, |user| {
            user.remove_from_wishlist(product_id);
            Ok(())
        })
        .await
    }

    async fn mutate<F>(&self, user_id: Uuid, edit: F) -> PortResult<User>
    where
        F: FnOnce(&mut User) -> PortResult<()> + Send,
    {
        let _guard = self.locks.lock(user_id).await;
        let mut user = self.load(user_id).await?;
        edit(&mut user)?;
        user.updated_at = Utc::now();
        self.db.save_user(&user).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
