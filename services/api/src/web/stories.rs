//! services/api/src/web/stories.rs
//!
//! Farmer success stories: public submission and listing, admin moderation.
//! Successful responses use the `{ success, message?, count?, data? }`
//! envelope the storefront expects for this resource.

use agro_shop_core::domain::{NewSuccessStory, ProductTag, SuccessStory};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{not_found_as, ApiError, ApiResult};
use crate::web::state::{AppState, AuthUser};

/// How many approved stories the public listing shows.
pub const PUBLIC_STORY_LIMIT: usize = 6;

const STORY_NOT_FOUND: &str = "Success story not found";

#[derive(Serialize)]
pub struct StoryEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> StoryEnvelope<T> {
    fn message(text: &str, data: Option<T>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(text.to_string()),
            count: None,
            data,
        })
    }
}

impl StoryEnvelope<Vec<SuccessStory>> {
    fn list(stories: Vec<SuccessStory>) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            count: Some(stories.len()),
            data: Some(stories),
        })
    }
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStoryRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "Crop is required"))]
    pub crop: String,
    #[validate(range(min = 0.0, message = "Yield increase cannot be negative"))]
    pub yield_increase: f64,
    #[validate(range(min = 0.0, message = "Profit increase cannot be negative"))]
    pub profit_increase: f64,
    #[validate(range(min = 0.0, message = "Time saved cannot be negative"))]
    pub time_saved: f64,
    #[validate(length(min = 1, message = "Testimonial is required"))]
    pub testimonial: String,
    /// Any of Seeds, Fertilizers, Sprayers, Pesticides.
    #[serde(default)]
    pub products_used: Vec<String>,
}

impl SubmitStoryRequest {
    fn into_new_story(self) -> ApiResult<NewSuccessStory> {
        let products_used = self
            .products_used
            .iter()
            .map(|p| p.parse::<ProductTag>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::BadRequest)?;
        Ok(NewSuccessStory {
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
            crop: self.crop.trim().to_string(),
            yield_increase: self.yield_increase,
            profit_increase: self.profit_increase,
            time_saved: self.time_saved,
            testimonial: self.testimonial.trim().to_string(),
            products_used,
        })
    }
}

//=========================================================================================
// Public Handlers
//=========================================================================================

/// POST /success-stories - Submit a story for review
#[utoipa::path(
    post,
    path = "/api/success-stories",
    request_body = SubmitStoryRequest,
    responses(
        (status = 201, description = "Story stored unapproved"),
        (status = 400, description = "Invalid story", body = crate::web::rest::MessageResponse),
    ),
    tag = "success-stories"
)]
pub async fn submit_story_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitStoryRequest>,
) -> ApiResult<(StatusCode, Json<StoryEnvelope<SuccessStory>>)> {
    req.validate()?;
    let story = state.db.create_story(req.into_new_story()?).await?;
    info!(story_id = %story.id, "Success story submitted");
    Ok((
        StatusCode::CREATED,
        StoryEnvelope::message(
            "Success story submitted successfully! It will be reviewed by our team.",
            Some(story),
        ),
    ))
}

/// GET /success-stories - Latest approved stories
#[utoipa::path(
    get,
    path = "/api/success-stories",
    responses((status = 200, description = "Up to six approved stories, newest approval first")),
    tag = "success-stories"
)]
pub async fn approved_stories_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StoryEnvelope<Vec<SuccessStory>>>> {
    let stories = state
        .db
        .list_stories(true, Some(PUBLIC_STORY_LIMIT))
        .await?;
    Ok(StoryEnvelope::list(stories))
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// GET /success-stories/admin - Every story, newest first
#[utoipa::path(
    get,
    path = "/api/success-stories/admin",
    responses((status = 200, description = "All stories")),
    security(("bearer" = [])),
    tag = "success-stories"
)]
pub async fn all_stories_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StoryEnvelope<Vec<SuccessStory>>>> {
    Ok(StoryEnvelope::list(state.db.list_stories(false, None).await?))
}

/// PUT /success-stories/{id}/approve
#[utoipa::path(
    put,
    path = "/api/success-stories/{id}/approve",
    params(("id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story approved"),
        (status = 404, description = "Success story not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "success-stories"
)]
pub async fn approve_story_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(story_id): Path<Uuid>,
) -> ApiResult<Json<StoryEnvelope<SuccessStory>>> {
    let mut story = state
        .db
        .get_story(story_id)
        .await
        .map_err(not_found_as(STORY_NOT_FOUND))?;
    let now = Utc::now();
    story.approve(auth.user.id, now);
    story.updated_at = now;
    let story = state.db.save_story(&story).await?;
    info!(story_id = %story.id, moderator = %auth.user.id, "Success story approved");
    Ok(StoryEnvelope::message(
        "Success story approved successfully",
        Some(story),
    ))
}

/// PUT /success-stories/{id}/reject - Clears approval; the story stays stored
#[utoipa::path(
    put,
    path = "/api/success-stories/{id}/reject",
    params(("id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story rejected"),
        (status = 404, description = "Success story not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "success-stories"
)]
pub async fn reject_story_handler(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<Uuid>,
) -> ApiResult<Json<StoryEnvelope<SuccessStory>>> {
    let mut story = state
        .db
        .get_story(story_id)
        .await
        .map_err(not_found_as(STORY_NOT_FOUND))?;
    story.reject();
    story.updated_at = Utc::now();
    let story = state.db.save_story(&story).await?;
    info!(story_id = %story.id, "Success story rejected");
    Ok(StoryEnvelope::message(
        "Success story rejected successfully",
        Some(story),
    ))
}

/// DELETE /success-stories/{id}
#[utoipa::path(
    delete,
    path = "/api/success-stories/{id}",
    params(("id" = Uuid, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story deleted"),
        (status = 404, description = "Success story not found", body = crate::web::rest::MessageResponse),
    ),
    security(("bearer" = [])),
    tag = "success-stories"
)]
pub async fn delete_story_handler(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<Uuid>,
) -> ApiResult<Json<StoryEnvelope<()>>> {
    state
        .db
        .delete_story(story_id)
        .await
        .map_err(not_found_as(STORY_NOT_FOUND))?;
    info!(story_id = %story_id, "Success story deleted");
    Ok(StoryEnvelope::message("Success story deleted successfully", None))
}
