// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! clipstream API Library
//!
//! REST backend for the clipstream social video platform. The core is the
//! credential and session-token subsystem: registration, login, logout,
//! refresh-token rotation, and password change.

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
