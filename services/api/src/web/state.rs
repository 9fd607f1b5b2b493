//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use agro_shop_core::accounts::AccountService;
use agro_shop_core::domain::User;
use agro_shop_core::locks::UserLocks;
use agro_shop_core::notify::NotificationDispatcher;
use agro_shop_core::orders::OrderService;
use agro_shop_core::ports::{DatabaseService, NotificationService, PaymentReferenceService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub orders: OrderService,
    pub accounts: AccountService,
    pub notifier: NotificationDispatcher,
}

impl AppState {
    /// Wires the services over the given collaborators and starts the mail
    /// worker. Must be called inside a tokio runtime.
    pub fn new(
        db: Arc<dyn DatabaseService>,
        config: Arc<Config>,
        mailer: Arc<dyn NotificationService>,
        payments: Arc<dyn PaymentReferenceService>,
    ) -> Self {
        let (notifier, _worker) = NotificationDispatcher::spawn(mailer);
        let locks = UserLocks::new();
        Self {
            orders: OrderService::new(db.clone(), payments, notifier.clone(), locks.clone()),
            accounts: AccountService::new(db.clone(), locks),
            db,
            config,
            notifier,
        }
    }
}

//=========================================================================================
// Request-scoped Identity
//=========================================================================================

/// The caller, as resolved by `require_auth` and stored in request extensions.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
    /// The bearer token presented, so logout can revoke exactly this session.
    pub token: String,
}
