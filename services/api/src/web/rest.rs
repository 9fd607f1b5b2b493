//! services/api/src/web/rest.rs
//!
//! Shared REST response shapes, the health probe, and the master definition
//! for the OpenAPI specification.

use axum::response::Json;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::web::{admin, auth, categories, orders, products, stories, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::forgot_password_handler,
        auth::reset_password_handler,
        orders::place_order_handler,
        orders::my_orders_handler,
        orders::get_order_handler,
        orders::list_orders_handler,
        orders::update_status_handler,
        products::list_products_handler,
        products::get_product_handler,
        products::create_product_handler,
        products::update_product_handler,
        products::delete_product_handler,
        products::add_review_handler,
        categories::list_categories_handler,
        categories::create_category_handler,
        categories::setup_agriculture_handler,
        categories::update_category_handler,
        categories::delete_category_handler,
        users::get_profile_handler,
        users::update_profile_handler,
        users::get_cart_handler,
        users::add_to_cart_handler,
        users::remove_from_cart_handler,
        users::get_wishlist_handler,
        users::add_to_wishlist_handler,
        users::remove_from_wishlist_handler,
        users::user_orders_handler,
        admin::dashboard_handler,
        admin::list_users_handler,
        admin::get_user_handler,
        admin::update_user_handler,
        admin::delete_user_handler,
        admin::toggle_suspend_handler,
        admin::reset_user_password_handler,
        stories::submit_story_handler,
        stories::approved_stories_handler,
        stories::all_stories_handler,
        stories::approve_story_handler,
        stories::reject_story_handler,
        stories::delete_story_handler,
    ),
    components(
        schemas(
            MessageResponse,
            HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            auth::AuthResponse,
            orders::PlaceOrderBody,
            orders::UpdateStatusRequest,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ReviewRequest,
            categories::CreateCategoryRequest,
            categories::UpdateCategoryRequest,
            categories::SetupCategoriesResponse,
            users::UpdateProfileRequest,
            users::AddToCartRequest,
            users::WishlistRequest,
            admin::DashboardStats,
            admin::AdminUpdateUserRequest,
            admin::AdminResetPasswordRequest,
            stories::SubmitStoryRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and password reset."),
        (name = "orders", description = "Checkout and order tracking."),
        (name = "products", description = "Catalog and reviews."),
        (name = "categories", description = "Product categories."),
        (name = "users", description = "Profile, server-side cart and wishlist."),
        (name = "admin", description = "Dashboard and account moderation."),
        (name = "success-stories", description = "Farmer testimonials and their moderation.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token scheme referenced by `security(("bearer" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The `{ "message": ... }` body used for acknowledgements and errors alike.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
