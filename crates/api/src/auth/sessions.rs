//! Session manager
//!
//! Orchestrates registration, login, refresh, logout, and password change by
//! composing the password hasher, the token issuer, and the user directory.
//! Holds no session state of its own: a "session" is the
//! (access token, refresh token, stored refresh token) triple.
//!
//! Refresh tokens are single-slot per user: every successful login or refresh
//! overwrites the stored value, invalidating whatever was issued before,
//! including to other devices. Concurrent rotations are last-writer-wins by
//! design; no locking is taken across the read-then-write of a user record.

use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use uuid::Uuid;

use super::jwt::JwtManager;
use super::password;
use crate::directory::{NewUser, PublicUser, User, UserDirectory};
use crate::error::{ApiError, ApiResult};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    /// Pre-uploaded object store references; upload itself is out of scope.
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// Outcome of a successful login or refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    directory: Arc<dyn UserDirectory>,
    jwt: JwtManager,
}

impl SessionManager {
    pub fn new(directory: Arc<dyn UserDirectory>, jwt: JwtManager) -> Self {
        Self { directory, jwt }
    }

    /// Create a user record. Exactly one directory write; the returned payload
    /// carries no credential fields.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<PublicUser> {
        if req.full_name.trim().is_empty() {
            return Err(ApiError::Validation("full name is required".to_string()));
        }
        if !is_valid_email(&req.email) {
            return Err(ApiError::Validation("invalid email format".to_string()));
        }
        let username = req.username.trim().to_lowercase();
        if username.is_empty() {
            return Err(ApiError::Validation("username is required".to_string()));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "password should be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        if self.directory.find_by_email(&req.email).await?.is_some()
            || self.directory.find_by_username(&username).await?.is_some()
        {
            return Err(ApiError::Conflict("user already exists".to_string()));
        }

        let password_hash = password::hash_password(&req.password)?;

        let user = self
            .directory
            .create(NewUser {
                username,
                email: req.email,
                full_name: req.full_name,
                avatar: req.avatar.unwrap_or_default(),
                cover_image: req.cover_image.unwrap_or_default(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(PublicUser::from(&user))
    }

    /// Authenticate by email and password. Unknown email and wrong password
    /// are deliberately indistinguishable to the caller.
    pub async fn login(&self, email: &str, plain_password: &str) -> ApiResult<SessionTokens> {
        if email.is_empty() || plain_password.is_empty() {
            return Err(ApiError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let Some(mut user) = self.directory.find_by_email(email).await? else {
            return Err(invalid_credentials());
        };

        if !password::verify_password(&user.password_hash, plain_password) {
            return Err(invalid_credentials());
        }

        let tokens = self.issue_session(&mut user).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a fresh access+refresh pair. The presented
    /// token must be well-formed, unexpired, and textually equal to the stored
    /// one; any deviation is `Unauthorized`. Rotation happens here: the new
    /// refresh token replaces the stored value, so each token redeems at most
    /// once.
    pub async fn refresh(&self, presented: Option<&str>) -> ApiResult<SessionTokens> {
        let token = presented
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("refresh token is required".to_string()))?;

        let claims = self
            .jwt
            .verify_refresh(token)
            .map_err(|_| ApiError::Unauthorized("invalid or expired refresh token".to_string()))?;

        let Some(mut user) = self.directory.find_by_id(claims.sub).await? else {
            return Err(ApiError::Unauthorized(
                "invalid or expired refresh token".to_string(),
            ));
        };

        if user.refresh_token.as_deref() != Some(token) {
            return Err(ApiError::Unauthorized(
                "refresh token is expired or has been rotated".to_string(),
            ));
        }

        let tokens = self.issue_session(&mut user).await?;
        tracing::debug!(user_id = %user.id, "refresh token rotated");
        Ok(tokens)
    }

    /// Clear the stored refresh token, ending the user's session. The caller
    /// is responsible for discarding transport-level cookies.
    pub async fn logout(&self, user_id: Uuid) -> ApiResult<()> {
        let Some(mut user) = self.directory.find_by_id(user_id).await? else {
            return Err(ApiError::NotFound("user not found".to_string()));
        };

        user.refresh_token = None;
        self.directory.update(&user).await?;
        tracing::info!(user_id = %user.id, "user logged out");
        Ok(())
    }

    /// Change the password after re-verifying the current one. Existing
    /// sessions stay valid: the refresh token is neither rotated nor cleared.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(ApiError::Validation(
                "current and new password are required".to_string(),
            ));
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "password should be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        let Some(mut user) = self.directory.find_by_id(user_id).await? else {
            return Err(ApiError::NotFound("user not found".to_string()));
        };

        if !password::verify_password(&user.password_hash, current_password) {
            return Err(ApiError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }

        // Assign the plaintext and let the directory's pre-save policy hash it.
        user.password_hash = new_password.to_string();
        self.directory.update(&user).await?;
        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Mint an access+refresh pair and persist the rotated refresh token.
    /// The single write keeps the stored token equal to the freshest one
    /// issued.
    async fn issue_session(&self, user: &mut User) -> ApiResult<SessionTokens> {
        let access_token = self
            .jwt
            .issue_access(user)
            .map_err(|e| ApiError::Internal(anyhow!(e)))?;
        let refresh_token = self
            .jwt
            .issue_refresh(user.id)
            .map_err(|e| ApiError::Internal(anyhow!(e)))?;

        user.refresh_token = Some(refresh_token.clone());
        let saved = self.directory.update(user).await?;

        Ok(SessionTokens {
            user: PublicUser::from(&saved),
            access_token,
            refresh_token,
        })
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("invalid email or password".to_string())
}

/// Minimal email shape check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}
