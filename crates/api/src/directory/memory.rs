//! In-memory user directory for hermetic tests.
//!
//! Mirrors the Postgres implementation's contract: unique email/username
//! (duplicates surface as `Conflict`), whole-record atomic update, and the
//! pre-save hashing policy.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{NewUser, User, UserDirectory};
use crate::auth::password;
use crate::error::{ApiError, ApiResult};

#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, User>> {
        match self.users.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.lock().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        Ok(self
            .lock()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> ApiResult<User> {
        let mut users = self.lock();

        if users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(ApiError::Conflict("user already exists".to_string()));
        }

        let password_hash = if password::is_digest(&user.password_hash) {
            user.password_hash
        } else {
            password::hash_password(&user.password_hash)?
        };

        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            cover_image: user.cover_image,
            password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, user: &User) -> ApiResult<User> {
        let mut user = user.clone();
        user.ensure_password_hashed()?;
        user.updated_at = OffsetDateTime::now_utc();

        let mut users = self.lock();
        if !users.contains_key(&user.id) {
            return Err(ApiError::NotFound("user not found".to_string()));
        }
        // Same conflict the Postgres unique indexes raise.
        if users
            .values()
            .any(|u| u.id != user.id && (u.email == user.email || u.username == user.username))
        {
            return Err(ApiError::Conflict("user already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
