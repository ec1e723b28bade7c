//! Session manager tests
//!
//! Exercise the register/login/refresh/logout/change-password state machine
//! against the in-memory directory, including rotation and revocation edges.

use std::sync::Arc;

use time::Duration;
use uuid::Uuid;

use super::jwt::JwtManager;
use super::sessions::{RegisterRequest, SessionManager};
use crate::directory::{memory::MemoryDirectory, UserDirectory};
use crate::error::ApiError;

fn manager() -> (SessionManager, Arc<MemoryDirectory>) {
    let directory = Arc::new(MemoryDirectory::new());
    let jwt = JwtManager::new(
        "test-access-secret",
        "test-refresh-secret",
        Duration::minutes(15),
        Duration::days(7),
    );
    (
        SessionManager::new(directory.clone(), jwt),
        directory,
    )
}

fn ana() -> RegisterRequest {
    RegisterRequest {
        full_name: "Ana".to_string(),
        email: "a@x.com".to_string(),
        username: "ana".to_string(),
        password: "secret1".to_string(),
        avatar: None,
        cover_image: None,
    }
}

#[tokio::test]
async fn register_creates_user_without_secrets() {
    let (sessions, directory) = manager();

    let public = sessions.register(ana()).await.unwrap();
    assert_eq!(public.username, "ana");
    assert_eq!(public.email, "a@x.com");

    let stored = directory.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "secret1");
    assert!(stored.refresh_token.is_none());
}

#[tokio::test]
async fn register_case_folds_username() {
    let (sessions, directory) = manager();

    let mut req = ana();
    req.username = "  AnA ".to_string();
    sessions.register(req).await.unwrap();

    assert!(directory.find_by_username("ana").await.unwrap().is_some());
}

#[tokio::test]
async fn register_rejects_duplicates() {
    let (sessions, _) = manager();
    sessions.register(ana()).await.unwrap();

    // Same email, different username.
    let mut dup_email = ana();
    dup_email.username = "other".to_string();
    assert!(matches!(
        sessions.register(dup_email).await,
        Err(ApiError::Conflict(_))
    ));

    // Same username (different case), different email.
    let mut dup_username = ana();
    dup_username.email = "b@x.com".to_string();
    dup_username.username = "ANA".to_string();
    assert!(matches!(
        sessions.register(dup_username).await,
        Err(ApiError::Conflict(_))
    ));
}

#[tokio::test]
async fn register_validates_input() {
    let (sessions, _) = manager();

    let mut bad_email = ana();
    bad_email.email = "not-an-email".to_string();
    assert!(matches!(
        sessions.register(bad_email).await,
        Err(ApiError::Validation(_))
    ));

    let mut short_password = ana();
    short_password.password = "pw".to_string();
    assert!(matches!(
        sessions.register(short_password).await,
        Err(ApiError::Validation(_))
    ));

    let mut blank_username = ana();
    blank_username.username = "   ".to_string();
    assert!(matches!(
        sessions.register(blank_username).await,
        Err(ApiError::Validation(_))
    ));

    let mut blank_name = ana();
    blank_name.full_name = String::new();
    assert!(matches!(
        sessions.register(blank_name).await,
        Err(ApiError::Validation(_))
    ));
}

#[tokio::test]
async fn login_returns_distinct_tokens_and_stores_refresh() {
    let (sessions, directory) = manager();
    sessions.register(ana()).await.unwrap();

    let tokens = sessions.login("a@x.com", "secret1").await.unwrap();
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
    assert_ne!(tokens.access_token, tokens.refresh_token);

    let stored = directory.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some(tokens.refresh_token.as_str()));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (sessions, _) = manager();
    sessions.register(ana()).await.unwrap();

    let wrong_password = sessions.login("a@x.com", "wrong-pass").await.unwrap_err();
    let unknown_email = sessions.login("ghost@x.com", "secret1").await.unwrap_err();

    // Same kind, same status, same message: no user enumeration.
    assert!(matches!(wrong_password, ApiError::Unauthorized(_)));
    assert!(matches!(unknown_email, ApiError::Unauthorized(_)));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(wrong_password.status_code(), unknown_email.status_code());
}

#[tokio::test]
async fn login_rotates_existing_session() {
    let (sessions, _) = manager();
    sessions.register(ana()).await.unwrap();

    let first = sessions.login("a@x.com", "secret1").await.unwrap();
    let _second = sessions.login("a@x.com", "secret1").await.unwrap();

    // The first device's refresh token lost its authority on the second login.
    assert!(matches!(
        sessions.refresh(Some(&first.refresh_token)).await,
        Err(ApiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn refresh_rotates_and_supersedes() {
    let (sessions, _) = manager();
    sessions.register(ana()).await.unwrap();
    let login = sessions.login("a@x.com", "secret1").await.unwrap();

    let refreshed = sessions.refresh(Some(&login.refresh_token)).await.unwrap();
    assert_ne!(refreshed.refresh_token, login.refresh_token);

    // The original token redeems at most once.
    assert!(matches!(
        sessions.refresh(Some(&login.refresh_token)).await,
        Err(ApiError::Unauthorized(_))
    ));

    // The rotated token is the live one.
    assert!(sessions.refresh(Some(&refreshed.refresh_token)).await.is_ok());
}

#[tokio::test]
async fn refresh_rejects_missing_and_malformed_tokens() {
    let (sessions, _) = manager();

    assert!(matches!(
        sessions.refresh(None).await,
        Err(ApiError::Unauthorized(_))
    ));
    assert!(matches!(
        sessions.refresh(Some("")).await,
        Err(ApiError::Unauthorized(_))
    ));
    assert!(matches!(
        sessions.refresh(Some("not.a.jwt")).await,
        Err(ApiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn refresh_rejects_well_formed_token_for_missing_user() {
    let (sessions, _) = manager();
    let jwt = JwtManager::new(
        "test-access-secret",
        "test-refresh-secret",
        Duration::minutes(15),
        Duration::days(7),
    );

    // Correctly signed, but no such user in the directory.
    let token = jwt.issue_refresh(Uuid::new_v4()).unwrap();
    assert!(matches!(
        sessions.refresh(Some(&token)).await,
        Err(ApiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn logout_revokes_all_outstanding_refresh_tokens() {
    let (sessions, directory) = manager();
    let user = sessions.register(ana()).await.unwrap();
    let login = sessions.login("a@x.com", "secret1").await.unwrap();

    sessions.logout(user.id).await.unwrap();

    let stored = directory.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.refresh_token.is_none());

    assert!(matches!(
        sessions.refresh(Some(&login.refresh_token)).await,
        Err(ApiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn logout_unknown_user_is_not_found() {
    let (sessions, _) = manager();
    assert!(matches!(
        sessions.logout(Uuid::new_v4()).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn change_password_wrong_current_leaves_hash_untouched() {
    let (sessions, directory) = manager();
    let user = sessions.register(ana()).await.unwrap();
    let before = directory.find_by_id(user.id).await.unwrap().unwrap();

    let err = sessions
        .change_password(user.id, "wrong-pass", "newsecret")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    let after = directory.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(before.password_hash, after.password_hash);
}

#[tokio::test]
async fn change_password_requires_both_fields_and_min_length() {
    let (sessions, _) = manager();
    let user = sessions.register(ana()).await.unwrap();

    assert!(matches!(
        sessions.change_password(user.id, "", "newsecret").await,
        Err(ApiError::Validation(_))
    ));
    assert!(matches!(
        sessions.change_password(user.id, "secret1", "").await,
        Err(ApiError::Validation(_))
    ));
    assert!(matches!(
        sessions.change_password(user.id, "secret1", "tiny").await,
        Err(ApiError::Validation(_))
    ));
}

#[tokio::test]
async fn change_password_takes_effect_and_is_hashed() {
    let (sessions, directory) = manager();
    let user = sessions.register(ana()).await.unwrap();

    sessions
        .change_password(user.id, "secret1", "newsecret")
        .await
        .unwrap();

    // The plaintext flowed through the pre-save policy, never into storage.
    let stored = directory.find_by_id(user.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "newsecret");

    assert!(matches!(
        sessions.login("a@x.com", "secret1").await,
        Err(ApiError::Unauthorized(_))
    ));
    assert!(sessions.login("a@x.com", "newsecret").await.is_ok());
}

#[tokio::test]
async fn change_password_keeps_existing_session_valid() {
    let (sessions, _) = manager();
    let user = sessions.register(ana()).await.unwrap();
    let login = sessions.login("a@x.com", "secret1").await.unwrap();

    sessions
        .change_password(user.id, "secret1", "newsecret")
        .await
        .unwrap();

    // Documented as-is behavior: the refresh token survives a password change.
    assert!(sessions.refresh(Some(&login.refresh_token)).await.is_ok());
}

#[tokio::test]
async fn change_password_unknown_user_is_not_found() {
    let (sessions, _) = manager();
    assert!(matches!(
        sessions
            .change_password(Uuid::new_v4(), "secret1", "newsecret")
            .await,
        Err(ApiError::NotFound(_))
    ));
}
