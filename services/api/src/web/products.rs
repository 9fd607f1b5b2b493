//! services/api/src/web/products.rs
//!
//! Catalog browsing, admin product maintenance and product reviews.

use agro_shop_core::domain::{NewProduct, Product, ProductFilter};
use agro_shop_core::ports::PortError;
use agro_shop_core::reviews;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{not_found_as, ApiError, ApiResult};
use crate::web::rest::{message, MessageResponse};
use crate::web::state::{AppState, AuthUser};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Category id to filter by.
    pub category: Option<Uuid>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub category: Uuid,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
}

/// Partial update: absent or blank fields keep their current value.
#[derive(Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub category: Option<Uuid>,
    pub images: Option<Vec<String>>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
}

fn non_negative(price: Decimal) -> ApiResult<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::BadRequest("Price cannot be negative".to_string()));
    }
    Ok(price)
}

async fn ensure_category(state: &AppState, category: Uuid) -> ApiResult<()> {
    state.db.get_category(category).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            ApiError::BadRequest("Category does not exist".to_string())
        }
        other => other.into(),
    })?;
    Ok(())
}

impl UpdateProductRequest {
    fn apply(self, product: &mut Product) {
        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            product.name = name;
        }
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
        product.updated_at = Utc::now();
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /products - Browse the catalog
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses((status = 200, description = "Matching products")),
    tag = "products"
)]
pub async fn list_products_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category: query.category,
        search: query.search.map(|s| s.trim().to_string()),
    };
    Ok(Json(state.db.list_products(&filter).await?))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product"),
        (status = 404, description = "Product not found", body = MessageResponse),
    ),
    tag = "products"
)]
pub async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .get_product(product_id)
        .await
        .map_err(not_found_as("Product not found"))?;
    Ok(Json(product))
}

/// POST /products - Add a product (admin)
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid product", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate()?;
    let price = non_negative(req.price)?;
    ensure_category(&state, req.category).await?;

    let product = state
        .db
        .create_product(NewProduct {
            name: req.name.trim().to_string(),
            description: req.description,
            price,
            category: req.category,
            images: req.images,
            stock: req.stock,
            rating: req.rating.unwrap_or(0.0),
        })
        .await?;
    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /products/{id} - Partial update (admin)
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    request_body = UpdateProductRequest,
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "The updated product"),
        (status = 404, description = "Product not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;
    if let Some(price) = req.price {
        non_negative(price)?;
    }
    if let Some(category) = req.category {
        ensure_category(&state, category).await?;
    }

    let mut product = state
        .db
        .get_product(product_id)
        .await
        .map_err(not_found_as("Product not found"))?;
    req.apply(&mut product);
    let product = state.db.save_product(&product).await?;
    info!(product_id = %product.id, "Product updated");
    Ok(Json(product))
}

/// DELETE /products/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product removed", body = MessageResponse),
        (status = 404, description = "Product not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .db
        .delete_product(product_id)
        .await
        .map_err(not_found_as("Product not found"))?;
    info!(product_id = %product_id, "Product deleted");
    Ok(message("Product removed"))
}

/// POST /products/{id}/review - One review per user per product
#[utoipa::path(
    post,
    path = "/api/products/{id}/review",
    request_body = ReviewRequest,
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 201, description = "Review added", body = MessageResponse),
        (status = 400, description = "Product already reviewed", body = MessageResponse),
        (status = 404, description = "Product not found", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn add_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.validate()?;
    reviews::submit_review(
        state.db.as_ref(),
        product_id,
        &auth.user,
        req.rating,
        req.comment.trim(),
    )
    .await?;
    Ok((StatusCode::CREATED, message("Review added")))
}
