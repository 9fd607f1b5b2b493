pub mod admin;
pub mod auth;
pub mod categories;
pub mod middleware;
pub mod orders;
pub mod products;
pub mod rest;
pub mod state;
pub mod stories;
pub mod users;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::{ApiError, ApiResult};
use middleware::{require_admin, require_auth};
use rest::{health_handler, ApiDoc};
use state::AppState;

/// Builds the complete application: `/api/...` routes, `/health` and the
/// Swagger UI, with CORS for the storefront origin and request tracing.
pub fn build_router(state: Arc<AppState>) -> ApiResult<Router> {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/forgot-password", post(auth::forgot_password_handler))
        .route("/auth/reset-password/{token}", post(auth::reset_password_handler))
        .route("/products", get(products::list_products_handler))
        .route("/products/{id}", get(products::get_product_handler))
        .route("/categories", get(categories::list_categories_handler))
        .route(
            "/success-stories",
            get(stories::approved_stories_handler).post(stories::submit_story_handler),
        );

    // Protected routes (any signed-in, unsuspended user)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/orders", post(orders::place_order_handler))
        .route("/orders/my", get(orders::my_orders_handler))
        .route("/orders/{id}", get(orders::get_order_handler))
        .route("/products/{id}/review", post(products::add_review_handler))
        .route(
            "/users/profile",
            get(users::get_profile_handler).put(users::update_profile_handler),
        )
        .route(
            "/users/cart",
            get(users::get_cart_handler).post(users::add_to_cart_handler),
        )
        .route("/users/cart/{product_id}", delete(users::remove_from_cart_handler))
        .route(
            "/users/wishlist",
            get(users::get_wishlist_handler).post(users::add_to_wishlist_handler),
        )
        .route(
            "/users/wishlist/{product_id}",
            delete(users::remove_from_wishlist_handler),
        )
        .route("/users/orders", get(users::user_orders_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin routes; the outer layer authenticates, the inner one checks the role
    let admin_routes = Router::new()
        .route("/orders", get(orders::list_orders_handler))
        .route("/orders/{id}/status", put(orders::update_status_handler))
        .route("/products", post(products::create_product_handler))
        .route(
            "/products/{id}",
            put(products::update_product_handler).delete(products::delete_product_handler),
        )
        .route("/categories", post(categories::create_category_handler))
        .route(
            "/categories/setup-agriculture",
            post(categories::setup_agriculture_handler),
        )
        .route(
            "/categories/{id}",
            put(categories::update_category_handler).delete(categories::delete_category_handler),
        )
        .route("/admin/dashboard", get(admin::dashboard_handler))
        .route("/admin/users", get(admin::list_users_handler))
        .route(
            "/admin/users/{id}",
            get(admin::get_user_handler)
                .put(admin::update_user_handler)
                .delete(admin::delete_user_handler),
        )
        .route("/admin/users/{id}/suspend", put(admin::toggle_suspend_handler))
        .route(
            "/admin/users/{id}/reset-password",
            put(admin::reset_user_password_handler),
        )
        .route("/success-stories/admin", get(stories::all_stories_handler))
        .route("/success-stories/{id}/approve", put(stories::approve_story_handler))
        .route("/success-stories/{id}/reject", put(stories::reject_story_handler))
        .route("/success-stories/{id}", delete(stories::delete_story_handler))
        .route_layer(axum_middleware::from_fn(require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes);

    let app = Router::new()
        .nest("/api", api_router)
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&state.config.client_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn cors_layer(client_url: &str) -> ApiResult<CorsLayer> {
    let origin = client_url
        .trim_end_matches('/')
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("CLIENT_URL is not a valid origin: {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(orders::IDEMPOTENCY_HEADER),
        ]))
}
