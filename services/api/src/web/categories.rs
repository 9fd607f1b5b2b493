//! services/api/src/web/categories.rs
//!
//! Product categories, including the one-shot agriculture seed set.

use agro_shop_core::domain::Category;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{not_found_as, ApiResult};
use crate::web::rest::{message, MessageResponse};
use crate::web::state::AppState;

/// The categories every agricultural storefront starts with.
pub const AGRICULTURE_CATEGORIES: [(&str, &str); 4] = [
    ("Seeds", "Quality seeds for better yield and crop production"),
    ("Fertilizers", "Organic and chemical fertilizers for soil nutrition"),
    ("Sprayers", "Professional spraying equipment for crop protection"),
    ("Pesticides", "Crop protection products for pest control"),
];

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SetupCategoriesResponse {
    pub message: String,
    #[schema(value_type = Vec<Object>)]
    pub created: Vec<Category>,
    /// Names that were already present and left alone.
    pub existing: Vec<String>,
}

/// GET /categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories")),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.list_categories().await?))
}

/// POST /categories (admin)
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created"),
        (status = 400, description = "Category already exists", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    req.validate()?;
    let category = state
        .db
        .create_category(req.name.trim(), req.description.as_deref())
        .await?;
    info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// POST /categories/setup-agriculture - Create any missing default categories (admin)
#[utoipa::path(
    post,
    path = "/api/categories/setup-agriculture",
    responses((status = 201, description = "Created and already-present categories", body = SetupCategoriesResponse)),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn setup_agriculture_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<SetupCategoriesResponse>)> {
    let mut created = Vec::new();
    let mut existing = Vec::new();
    for (name, description) in AGRICULTURE_CATEGORIES {
        if state.db.find_category_by_name(name).await?.is_some() {
            existing.push(name.to_string());
        } else {
            created.push(state.db.create_category(name, Some(description)).await?);
        }
    }
    info!(created = created.len(), existing = existing.len(), "Agriculture categories processed");
    Ok((
        StatusCode::CREATED,
        Json(SetupCategoriesResponse {
            message: "Agriculture categories processed".to_string(),
            created,
            existing,
        }),
    ))
}

/// PUT /categories/{id} (admin)
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    request_body = UpdateCategoryRequest,
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "The updated category"),
        (status = 404, description = "Category not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let mut category = state
        .db
        .get_category(category_id)
        .await
        .map_err(not_found_as("Category not found"))?;
    if let Some(name) = req.name.filter(|n| !n.trim().is_empty()) {
        category.name = name.trim().to_string();
    }
    if let Some(description) = req.description.filter(|d| !d.trim().is_empty()) {
        category.description = Some(description);
    }
    category.updated_at = Utc::now();
    Ok(Json(state.db.save_category(&category).await?))
}

/// DELETE /categories/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category removed", body = MessageResponse),
        (status = 404, description = "Category not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .db
        .delete_category(category_id)
        .await
        .map_err(not_found_as("Category not found"))?;
    info!(category_id = %category_id, "Category deleted");
    Ok(message("Category removed"))
}
