//! Authentication module for clipstream

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod sessions;
#[cfg(test)]
mod session_tests;

pub use jwt::{AccessClaims, JwtManager, RefreshClaims, TokenError};
pub use middleware::{require_auth, AuthState, CurrentUser};
pub use password::{hash_password, is_digest, verify_password};
pub use sessions::{RegisterRequest, SessionManager, SessionTokens};
