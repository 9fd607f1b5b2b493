//! Client-side pieces of the storefront: durable cart storage and the HTTP
//! checkout transport that `agro_shop_core::CartStore` drives.

pub mod http;
pub mod storage;

pub use http::{HttpOrderGateway, IDEMPOTENCY_HEADER};
pub use storage::FileCartStorage;
