//! Authentication endpoints
//!
//! Maps session-manager outcomes onto the HTTP contract: multipart signup,
//! JSON login, cookie-or-body refresh, and cookie lifecycle (set on
//! login/refresh, cleared on logout). Cookies carry only the opaque token
//! strings.

use axum::{
    extract::{Extension, Multipart, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::auth::middleware::{cookie_value, CurrentUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::sessions::{RegisterRequest, SessionTokens};
use crate::directory::PublicUser;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /signup - multipart form: fullName, email, userName, password, and
/// optional avatar/coverImage references (the upload itself happens in the
/// external media pipeline; we only store the resulting URLs).
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<ApiResponse<PublicUser>> {
    let mut full_name = None;
    let mut email = None;
    let mut username = None;
    let mut password = None;
    let mut avatar = None;
    let mut cover_image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            // Raw file parts belong to the media pipeline; drain and ignore.
            tracing::debug!(field = %name, "ignoring binary upload field");
            let _ = field.bytes().await;
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::Validation(format!("invalid multipart field {name}: {e}")))?;

        match name.as_str() {
            "fullName" => full_name = Some(value),
            "email" => email = Some(value),
            "userName" => username = Some(value),
            "password" => password = Some(value),
            "avatar" => avatar = Some(value),
            "coverImage" => cover_image = Some(value),
            _ => {}
        }
    }

    let user = state
        .sessions
        .register(RegisterRequest {
            full_name: full_name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
            avatar,
            cover_image,
        })
        .await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        "User registered successfully",
        user,
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /login - JSON email/password. Sets both token cookies.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let tokens = state.sessions.login(&body.email, &body.password).await?;
    Ok(session_response(&state, "User logged in successfully", tokens))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// POST /refresh-accesstoken - refresh token from the `refreshToken` cookie
/// or the JSON body. Re-sets both cookies on success.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<Response> {
    let presented = cookie_value(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token));

    let tokens = state.sessions.refresh(presented.as_deref()).await?;
    Ok(session_response(&state, "Access token refreshed", tokens))
}

/// POST /logout - clears the stored refresh token and expires both cookies.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Response> {
    state.sessions.logout(current.id).await?;

    let headers = AppendHeaders([
        (SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE)),
        (SET_COOKIE, clear_cookie(REFRESH_TOKEN_COOKIE)),
    ]);
    let body = ApiResponse::ok(
        "User logged out successfully",
        json!({ "message": "User logged out successfully" }),
    );

    Ok((headers, body).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// POST /change-password - re-verifies the current password first. Existing
/// sessions stay valid afterwards.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    state
        .sessions
        .change_password(
            current.id,
            body.current_password.as_deref().unwrap_or_default(),
            body.new_password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(ApiResponse::ok(
        "Password changed successfully",
        json!({ "message": "Password changed successfully" }),
    ))
}

/// Render a login/refresh outcome: envelope body plus both token cookies.
fn session_response(state: &AppState, message: &str, tokens: SessionTokens) -> Response {
    let access_max_age = Duration::minutes(state.config.access_token_expiry_minutes);
    let refresh_max_age = Duration::days(state.config.refresh_token_expiry_days);

    let headers = AppendHeaders([
        (
            SET_COOKIE,
            session_cookie(ACCESS_TOKEN_COOKIE, &tokens.access_token, access_max_age),
        ),
        (
            SET_COOKIE,
            session_cookie(REFRESH_TOKEN_COOKIE, &tokens.refresh_token, refresh_max_age),
        ),
    ]);

    (headers, ApiResponse::ok(message, tokens)).into_response()
}

fn session_cookie(name: &str, value: &str, max_age: Duration) -> String {
    format!(
        "{name}={value}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age={}",
        max_age.whole_seconds()
    )
}

fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0")
}
