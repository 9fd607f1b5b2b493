//! services/api/src/web/users.rs
//!
//! Self-service endpoints for the signed-in user: profile, the server-side
//! cart, the wishlist and order history.

use agro_shop_core::accounts::ProfileUpdate;
use agro_shop_core::domain::{CartEntry, Order, User};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{not_found_as, ApiResult};
use crate::web::auth::hash_password;
use crate::web::state::{AppState, AuthUser};

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    pub city_or_village: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    pub product_id: Uuid,
}

async fn ensure_product(state: &AppState, product_id: Uuid) -> ApiResult<()> {
    state
        .db
        .get_product(product_id)
        .await
        .map_err(not_found_as("Product not found"))?;
    Ok(())
}

//=========================================================================================
// Profile
//=========================================================================================

/// GET /users/profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses((status = 200, description = "The caller's account")),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_profile_handler(Extension(auth): Extension<AuthUser>) -> Json<User> {
    Json(auth.user)
}

/// PUT /users/profile - Absent or blank fields keep their current value
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "The updated account"),
        (status = 400, description = "Invalid field or email already in use", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    let hashed_password = req.password.as_deref().map(hash_password).transpose()?;
    let update = ProfileUpdate {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email.map(|e| e.trim().to_string()),
        city_or_village: req.city_or_village,
        contact_number: req.contact_number,
        address: req.address,
        hashed_password,
    };
    Ok(Json(state.accounts.update_profile(auth.user.id, update).await?))
}

//=========================================================================================
// Cart
//=========================================================================================

/// GET /users/cart
#[utoipa::path(
    get,
    path = "/api/users/cart",
    responses((status = 200, description = "Server-side cart entries")),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_cart_handler(Extension(auth): Extension<AuthUser>) -> Json<Vec<CartEntry>> {
    Json(auth.user.cart)
}

/// POST /users/cart - Merges with an existing entry for the same product
#[utoipa::path(
    post,
    path = "/api/users/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "The updated cart"),
        (status = 404, description = "Product not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn add_to_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<AddToCartRequest>,
) -> ApiResult<Json<Vec<CartEntry>>> {
    req.validate()?;
    ensure_product(&state, req.product_id).await?;
    let user = state
        .accounts
        .add_to_cart(auth.user.id, req.product_id, req.quantity.unwrap_or(1))
        .await?;
    Ok(Json(user.cart))
}

/// DELETE /users/cart/{product_id}
#[utoipa::path(
    delete,
    path = "/api/users/cart/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "The updated cart")),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn remove_from_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CartEntry>>> {
    let user = state.accounts.remove_from_cart(auth.user.id, product_id).await?;
    Ok(Json(user.cart))
}

//=========================================================================================
// Wishlist
//=========================================================================================

/// GET /users/wishlist
#[utoipa::path(
    get,
    path = "/api/users/wishlist",
    responses((status = 200, description = "Wishlisted product ids")),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_wishlist_handler(Extension(auth): Extension<AuthUser>) -> Json<Vec<Uuid>> {
    Json(auth.user.wishlist)
}

/// POST /users/wishlist - Adding a product twice is a no-op
#[utoipa::path(
    post,
    path = "/api/users/wishlist",
    request_body = WishlistRequest,
    responses(
        (status = 200, description = "The updated wishlist"),
        (status = 404, description = "Product not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn add_to_wishlist_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<WishlistRequest>,
) -> ApiResult<Json<Vec<Uuid>>> {
    ensure_product(&state, req.product_id).await?;
    let user = state
        .accounts
        .add_to_wishlist(auth.user.id, req.product_id)
        .await?;
    Ok(Json(user.wishlist))
}

/// DELETE /users/wishlist/{product_id}
#[utoipa::path(
    delete,
    path = "/api/users/wishlist/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "The updated wishlist")),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn remove_from_wishlist_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let user = state
        .accounts
        .remove_from_wishlist(auth.user.id, product_id)
        .await?;
    Ok(Json(user.wishlist))
}

/// GET /users/orders - Same listing as GET /orders/my
#[utoipa::path(
    get,
    path = "/api/users/orders",
    responses((status = 200, description = "The caller's orders")),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn user_orders_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_user_orders(auth.user.id).await?))
}
