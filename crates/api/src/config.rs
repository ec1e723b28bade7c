//! Server configuration
//!
//! Secrets and token lifetimes are read once at startup and passed explicitly
//! into the token issuer; business code never reads the environment directly.
//! This keeps tests deterministic (fixed secrets, fixed expiries).

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Signing secret for short-lived access tokens.
    pub access_token_secret: String,
    /// Independent signing secret for refresh tokens.
    pub refresh_token_secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            access_token_secret: std::env::var("ACCESS_TOKEN_SECRET")
                .context("ACCESS_TOKEN_SECRET must be set")?,
            refresh_token_secret: std::env::var("REFRESH_TOKEN_SECRET")
                .context("REFRESH_TOKEN_SECRET must be set")?,
            access_token_expiry_minutes: parse_env("ACCESS_TOKEN_EXPIRY_MINUTES", 15)?,
            refresh_token_expiry_days: parse_env("REFRESH_TOKEN_EXPIRY_DAYS", 7)?,
        })
    }
}

fn parse_env(name: &str, default: i64) -> anyhow::Result<i64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be an integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Fixed secrets and lifetimes for deterministic tests.
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            bind_address: "127.0.0.1:0".to_string(),
            access_token_secret: "test-access-secret".to_string(),
            refresh_token_secret: "test-refresh-secret".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }
}
