//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::web::state::{AppState, AuthUser};

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that validates the bearer token and resolves the caller.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// Missing or unknown tokens get 401; suspended accounts get 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?
        .to_string();

    let user_id = state.db.validate_auth_session(&token).await.map_err(|e| {
        debug!(error = %e, "Rejected auth session");
        ApiError::Unauthorized("Not authorized, token failed".to_string())
    })?;

    let user = state.db.get_user(user_id).await.map_err(|e| {
        warn!(user_id = %user_id, error = %e, "Session points at a missing user");
        ApiError::Unauthorized("Not authorized, token failed".to_string())
    })?;

    if user.is_suspended {
        return Err(ApiError::Forbidden("Your account has been suspended".to_string()));
    }

    req.extensions_mut().insert(AuthUser { user, token });
    Ok(next.run(req).await)
}

/// Must run after `require_auth`. Lets admins through, 403 for everyone else.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = req
        .extensions()
        .get::<AuthUser>()
        .map(|auth| auth.user.is_admin)
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))?;
    if !is_admin {
        return Err(ApiError::Forbidden("Not authorized as an admin".to_string()));
    }
    Ok(next.run(req).await)
}
