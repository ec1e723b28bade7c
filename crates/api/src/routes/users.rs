//! Profile endpoints
//!
//! Thin reads and writes through the user directory. Social-graph numbers
//! (subscriber counts, watch history) come from the aggregation service, not
//! from here.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::directory::PublicUser;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /get-profile - the caller's own profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let Some(user) = state.directory.find_by_id(current.id).await? else {
        return Err(ApiError::NotFound("user not found".to_string()));
    };

    Ok(ApiResponse::ok(
        "User profile fetched successfully",
        PublicUser::from(&user),
    ))
}

/// GET /get-profile/{username} - public profile lookup, case-insensitive.
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::Validation("username is missing".to_string()));
    }

    let Some(user) = state.directory.find_by_username(&username).await? else {
        return Err(ApiError::NotFound("user not found".to_string()));
    };

    Ok(ApiResponse::ok(
        "User profile fetched successfully",
        PublicUser::from(&user),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub user_name: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// PUT /updateUserProfile - updates the provided fields only. A username
/// collision surfaces as a conflict from the directory's unique index.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let Some(mut user) = state.directory.find_by_id(current.id).await? else {
        return Err(ApiError::NotFound("user not found".to_string()));
    };

    if let Some(full_name) = body.full_name {
        if full_name.trim().is_empty() {
            return Err(ApiError::Validation("full name is required".to_string()));
        }
        user.full_name = full_name;
    }
    if let Some(username) = body.user_name {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(ApiError::Validation("username is required".to_string()));
        }
        user.username = username;
    }
    if let Some(avatar) = body.avatar {
        user.avatar = avatar;
    }
    if let Some(cover_image) = body.cover_image {
        user.cover_image = cover_image;
    }

    let saved = state.directory.update(&user).await?;

    Ok(ApiResponse::ok(
        "User updated successfully",
        PublicUser::from(&saved),
    ))
}
