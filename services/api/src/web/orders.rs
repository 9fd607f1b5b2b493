//! services/api/src/web/orders.rs
//!
//! Checkout and order tracking endpoints.

use agro_shop_core::domain::{Order, OrderItem, OrderWithOwner, PaymentMethod, PriceBreakdown, ShippingAddress};
use agro_shop_core::orders::{PlaceOrderRequest, PlacedOrder};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::web::state::{AppState, AuthUser};

/// Client-generated key that makes a checkout attempt safe to retry.
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    #[serde(default)]
    #[validate(length(min = 1, message = "No order items"))]
    #[schema(value_type = Vec<Object>)]
    pub order_items: Vec<OrderItem>,
    #[schema(value_type = Object)]
    pub shipping_address: ShippingAddress,
    #[schema(value_type = String, example = "Online")]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub items_price: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub tax_price: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub shipping_price: Decimal,
    #[serde(default)]
    #[schema(value_type = f64)]
    pub total_price: Decimal,
}

impl From<PlaceOrderBody> for PlaceOrderRequest {
    fn from(body: PlaceOrderBody) -> Self {
        Self {
            order_items: body.order_items,
            shipping_address: body.shipping_address,
            payment_method: body.payment_method,
            prices: PriceBreakdown {
                items_price: body.items_price,
                tax_price: body.tax_price,
                shipping_price: body.shipping_price,
                total_price: body.total_price,
            },
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Free text; "Delivered" also marks the order delivered.
    #[serde(default)]
    pub status: String,
}

fn idempotency_key(headers: &HeaderMap) -> ApiResult<Option<String>> {
    let Some(raw) = headers.get(IDEMPOTENCY_HEADER) else {
        return Ok(None);
    };
    let key = raw
        .to_str()
        .map_err(|_| ApiError::BadRequest("Idempotency-Key must be ASCII".to_string()))?
        .trim();
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ApiError::BadRequest(format!(
            "Idempotency-Key must be 1 to {MAX_IDEMPOTENCY_KEY_LEN} characters"
        )));
    }
    Ok(Some(key.to_string()))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /orders - Place an order from a cart snapshot
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderBody,
    params(("Idempotency-Key" = Option<String>, Header, description = "Stable per checkout attempt; a replay returns the original order.")),
    responses(
        (status = 201, description = "Order placed; body is { order, qr }"),
        (status = 400, description = "No order items", body = crate::web::rest::MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn place_order_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    headers: HeaderMap,
    Json(body): Json<PlaceOrderBody>,
) -> ApiResult<(StatusCode, Json<PlacedOrder>)> {
    body.validate()?;
    let key = idempotency_key(&headers)?;
    let placed = state
        .orders
        .place_order(auth.user.id, body.into(), key.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /orders/my - The caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/orders/my",
    responses((status = 200, description = "The caller's orders")),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn my_orders_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list_user_orders(auth.user.id).await?))
}

/// GET /orders/{id} - One order with its owner's name and email
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order"),
        (status = 403, description = "Order belongs to someone else", body = crate::web::rest::MessageResponse),
        (status = 404, description = "Order not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn get_order_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderWithOwner>> {
    let order = state.orders.get_order(order_id).await?;
    if order.order.user != auth.user.id && !auth.user.is_admin {
        return Err(ApiError::Forbidden("Not authorized to view this order".to_string()));
    }
    Ok(Json(order))
}

/// GET /orders - Every order (admin)
#[utoipa::path(
    get,
    path = "/api/orders",
    responses((status = 200, description = "All orders with owners")),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<OrderWithOwner>>> {
    Ok(Json(state.orders.list_all_orders().await?))
}

/// PUT /orders/{id}/status - Change an order's status (admin)
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    request_body = UpdateStatusRequest,
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "The updated order"),
        (status = 404, description = "Order not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.orders.update_status(order_id, &req.status).await?))
}
