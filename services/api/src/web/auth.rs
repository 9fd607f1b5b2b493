//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration, login, logout and the password
//! reset round trip.

use agro_shop_core::domain::{NewUser, User};
use agro_shop_core::notify::Notification;
use agro_shop_core::ports::PortError;
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::web::rest::{message, MessageResponse};
use crate::web::state::{AppState, AuthUser};

/// How long a password reset link stays valid.
const RESET_TOKEN_MINUTES: i64 = 30;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub city_or_village: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(value_type = Object)]
    pub user: User,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

//=========================================================================================
// Password Helpers
//=========================================================================================

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

pub fn verify_password(password: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse password hash: {:?}", e);
            false
        }
    }
}

/// A fresh 32-byte token from the OS generator, rendered as 64 hex characters.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

async fn issue_session(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let token = random_token();
    let expires_at = Utc::now() + Duration::days(state.config.auth_session_days);
    state
        .db
        .create_auth_session(&token, user.id, expires_at)
        .await?;
    Ok(AuthResponse { user, token })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request or user already exists", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let hashed_password = hash_password(&req.password)?;

    let user = state
        .db
        .create_user(NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.trim().to_string(),
            hashed_password,
            is_admin: false,
            city_or_village: req.city_or_village,
            contact_number: req.contact_number,
        })
        .await?;
    info!(user_id = %user.id, "User registered");

    state
        .notifier
        .dispatch(Notification::welcome(&user.email, &user.first_name));

    let response = issue_session(&state, user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
        (status = 403, description = "Account suspended", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let creds = match state.db.get_user_by_email(req.email.trim()).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(e.into()),
    };
    if !verify_password(&req.password, &creds.hashed_password) {
        return Err(invalid());
    }
    if creds.user.is_suspended {
        return Err(ApiError::Forbidden("Your account has been suspended".to_string()));
    }

    info!(user_id = %creds.user.id, "User logged in");
    Ok(Json(issue_session(&state, creds.user).await?))
}

/// POST /auth/logout - Revoke the presented bearer token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "No active session", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.delete_auth_session(&auth.token).await?;
    Ok(message("Logged out successfully"))
}

/// POST /auth/forgot-password - Mail a password reset link
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent", body = MessageResponse),
        (status = 404, description = "No user with that email", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;
    let user = match state.db.get_user_by_email(req.email.trim()).await {
        Ok(creds) => creds.user,
        Err(PortError::NotFound(_)) => {
            return Err(ApiError::NotFound("No user with that email".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let token = random_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_MINUTES);
    state
        .db
        .set_password_reset_token(user.id, &token, expires_at)
        .await?;

    let reset_url = format!(
        "{}/reset-password/{}",
        state.config.client_url.trim_end_matches('/'),
        token
    );
    state
        .notifier
        .dispatch(Notification::password_reset(&user.email, &reset_url));
    info!(user_id = %user.id, "Password reset requested");

    Ok(message("Password reset link sent to your email."))
}

/// POST /auth/reset-password/{token} - Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    request_body = ResetPasswordRequest,
    params(("token" = String, Path, description = "Token from the reset link")),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;
    let user = state.db.get_user_by_reset_token(&token, Utc::now()).await?;
    let hashed = hash_password(&req.password)?;
    state.db.set_password(user.id, &hashed).await?;
    info!(user_id = %user.id, "Password reset completed");
    Ok(message("Password reset successful. You can now log in."))
}
