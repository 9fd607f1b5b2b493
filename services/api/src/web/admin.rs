//! services/api/src/web/admin.rs
//!
//! Admin-only dashboard and account moderation.

use agro_shop_core::accounts::AdminUserUpdate;
use agro_shop_core::domain::User;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{not_found_as, ApiResult};
use crate::web::auth::hash_password;
use crate::web::rest::{message, MessageResponse};
use crate::web::state::{AppState, AuthUser};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_orders: u64,
    /// Sum of every order's `totalPrice`.
    #[schema(value_type = f64)]
    pub total_sales: Decimal,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct AdminResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// GET /admin/dashboard
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses((status = 200, description = "Store totals", body = DashboardStats)),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn dashboard_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardStats>> {
    let total_users = state.db.count_users().await?;
    let totals = state.db.order_totals().await?;
    Ok(Json(DashboardStats {
        total_users,
        total_orders: totals.total_orders,
        total_sales: totals.total_sales,
    }))
}

/// GET /admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Every account")),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_users_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.list_users().await?))
}

/// GET /admin/users/{id}
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The account"),
        (status = 404, description = "User not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(not_found_as("User not found"))?;
    Ok(Json(user))
}

/// PUT /admin/users/{id} - Edit name, email or admin flag
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    request_body = AdminUpdateUserRequest,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The updated account"),
        (status = 404, description = "User not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    let update = AdminUserUpdate {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email.map(|e| e.trim().to_string()),
        is_admin: req.is_admin,
    };
    Ok(Json(state.accounts.admin_update(user_id, update).await?))
}

/// DELETE /admin/users/{id}
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed", body = MessageResponse),
        (status = 400, description = "Tried to delete own account", body = MessageResponse),
        (status = 403, description = "Target is an admin", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.accounts.delete_user(&auth.user, user_id).await?;
    Ok(message("User removed"))
}

/// PUT /admin/users/{id}/suspend - Toggle suspension
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/suspend",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User suspended or unsuspended", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn toggle_suspend_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state.accounts.toggle_suspension(user_id).await?;
    Ok(message(if user.is_suspended {
        "User suspended"
    } else {
        "User unsuspended"
    }))
}

/// PUT /admin/users/{id}/reset-password
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/reset-password",
    request_body = AdminResetPasswordRequest,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Password reset successfully", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn reset_user_password_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AdminResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;
    let hashed = hash_password(&req.password)?;
    state.accounts.force_password(user_id, &hashed).await?;
    Ok(message("Password reset successfully"))
}
