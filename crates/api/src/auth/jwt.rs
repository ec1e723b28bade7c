//! JWT issuing and verification
//!
//! Two independent signing contexts: access tokens carry a snapshot of the
//! user's public profile, refresh tokens carry only the user id. Each context
//! has its own secret and lifetime. The issuer is stateless; refresh
//! revocation happens in the session manager by comparing against the stored
//! token.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::directory::User;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, malformed structure, or expired.
    #[error("invalid or expired token")]
    Invalid,
    #[error("token signing failed")]
    Signing,
}

/// Claims embedded in an access token. Profile fields are a snapshot taken at
/// issuance for convenience; only `sub` is trusted for identity. Claim names
/// are camelCase like every other wire surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims embedded in a refresh token: the user id only. Refresh tokens never
/// authorize resource access, so they carry nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtManager {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtManager {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
            cover_image: user.cover_image.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.access_ttl).unix_timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding).map_err(|e| {
            tracing::error!(error = ?e, "failed to sign access token");
            TokenError::Signing
        })
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let claims = RefreshClaims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: (now + self.refresh_ttl).unix_timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(|e| {
            tracing::error!(error = ?e, "failed to sign refresh token");
            TokenError::Signing
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation
}
