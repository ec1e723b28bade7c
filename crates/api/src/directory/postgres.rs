//! Postgres-backed user directory

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{NewUser, User, UserDirectory};
use crate::error::ApiResult;

const USER_COLUMNS: &str = "id, username, email, full_name, avatar, cover_image, \
     password_hash, refresh_token, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> ApiResult<User> {
        // Same pre-save policy as update: a plaintext password never lands in
        // storage, and an already-hashed one is not hashed twice.
        let password_hash = if crate::auth::password::is_digest(&user.password_hash) {
            user.password_hash.clone()
        } else {
            crate::auth::password::hash_password(&user.password_hash)?
        };

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, full_name, avatar, cover_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, user: &User) -> ApiResult<User> {
        let mut user = user.clone();
        user.ensure_password_hashed()?;

        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                full_name = $4,
                avatar = $5,
                cover_image = $6,
                password_hash = $7,
                refresh_token = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }
}
