pub mod accounts;
pub mod cart;
pub mod domain;
pub mod locks;
pub mod memory;
pub mod notify;
pub mod orders;
pub mod ports;
pub mod reviews;

pub use accounts::{AccountService, AdminUserUpdate, ProfileUpdate};
pub use cart::{CartLine, CartState, CartStore, CheckoutDetails};
pub use domain::{
    AuthSession, CartEntry, Category, Order, OrderItem, PaymentMethod, PriceBreakdown, Product,
    ShippingAddress, SuccessStory, User, UserCredentials,
};
pub use locks::UserLocks;
pub use memory::InMemoryDatabase;
pub use notify::{Notification, NotificationDispatcher};
pub use orders::{OrderService, PlaceOrderRequest, PlacedOrder};
pub use ports::{
    CartStorage, DatabaseService, NotificationService, OrderGateway, PaymentReferenceService,
    PortError, PortResult,
};
