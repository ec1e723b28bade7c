//! User Directory
//!
//! Durable store of user records, keyed by id with unique username/email.
//! The session manager reads and mutates records through the [`UserDirectory`]
//! trait but does not own their persistence. A single `update` replaces the
//! whole record atomically; no cross-operation transactions are taken, so
//! interleaved read-then-write operations are last-writer-wins.

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password;
use crate::error::ApiResult;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgUserDirectory;

/// A stored user record. `password_hash` and `refresh_token` never reach
/// clients; serialize [`PublicUser`] instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
    /// At most one live refresh token per user; `None` means no active session.
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Pre-save hashing policy: if the password field holds a plaintext value
    /// (e.g. after a password change), hash it before the record is persisted.
    /// A value that already parses as a digest is left untouched, so re-saving
    /// an unmodified record never double-hashes.
    pub fn ensure_password_hashed(&mut self) -> ApiResult<()> {
        if !password::is_digest(&self.password_hash) {
            self.password_hash = password::hash_password(&self.password_hash)?;
        }
        Ok(())
    }
}

/// Fields required to create a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub password_hash: String,
}

/// Client-facing projection of a user record, with credential fields stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            created_at: user.created_at,
        }
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>>;
    /// Insert a new record. Duplicate email/username surfaces as `Conflict`.
    async fn create(&self, user: NewUser) -> ApiResult<User>;
    /// Replace the stored record with `user` (whole-record write).
    async fn update(&self, user: &User) -> ApiResult<User>;
}
