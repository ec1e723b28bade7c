//! Route wiring
//!
//! All user-facing routes are nested under `/api/v1/user`. Protected routes
//! sit behind the access-token middleware; everything else is public.

pub mod auth;
pub mod users;


use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::require_auth;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    let public = Router::new()
        .route("/signup", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-accesstoken", post(auth::refresh))
        .route("/get-profile/{username}", get(users::get_public_profile));

    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
        .route("/get-profile", get(users::get_profile))
        .route("/updateUserProfile", put(users::update_profile))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .nest("/api/v1/user", public.merge(protected))
        .with_state(state)
}
