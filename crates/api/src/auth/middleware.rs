//! Authentication middleware for Axum
//!
//! Verifies the access token and re-fetches the user from the directory;
//! the token's profile claims are convenience only and never trusted for
//! authorization beyond identifying the user.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::jwt::JwtManager;
use crate::directory::{User, UserDirectory};
use crate::error::ApiError;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// State needed to authenticate a request.
#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtManager,
    pub directory: Arc<dyn UserDirectory>,
}

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`]. Carries no credential fields.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
        }
    }
}

/// Read a named cookie from the `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    for cookie in cookies.split(';') {
        if let Some((key, value)) = cookie.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Extract the access token from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header.
fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, ACCESS_TOKEN_COOKIE) {
        return Some(token);
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(String::from)
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_access_token(request.headers()) else {
        return ApiError::Unauthorized("unauthorized user".to_string()).into_response();
    };

    let claims = match auth_state.jwt.verify_access(&token) {
        Ok(claims) => claims,
        Err(_) => {
            return ApiError::Unauthorized("invalid or expired access token".to_string())
                .into_response();
        }
    };

    // Re-fetch so a deleted user's still-unexpired token stops working.
    let user = match auth_state.directory.find_by_id(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(user_id = %claims.sub, "access token for missing user");
            return ApiError::Unauthorized("invalid access token".to_string()).into_response();
        }
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(CurrentUser::from(&user));
    next.run(request).await
}
