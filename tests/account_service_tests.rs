mod common;

use common::InMemoryRepository;
use squad_manager::{
    auth::decode_token,
    config::AppConfig,
    error::AppError,
    models::Role,
    services::{accounts, users},
};

const PASSWORD: &str = "correct-horse";

#[tokio::test]
async fn signup_normalizes_email() {
    let repo = InMemoryRepository::new();

    let user = accounts::signup(&repo, "  Coach.Smith@Example.COM ", PASSWORD, Role::Coach)
        .await
        .unwrap();

    assert_eq!(user.email, "coach.smith@example.com");
    assert_eq!(user.role, Role::Coach);
    assert_eq!(repo.stored_email(user.id).as_deref(), Some("coach.smith@example.com"));
}

#[tokio::test]
async fn duplicate_email_is_rejected_regardless_of_case_and_whitespace() {
    let repo = InMemoryRepository::new();
    accounts::signup(&repo, "player@example.com", PASSWORD, Role::Player)
        .await
        .unwrap();

    let err = accounts::signup(&repo, " PLAYER@example.com", PASSWORD, Role::Coach)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Email already registered"));
}

#[tokio::test]
async fn login_issues_token_for_stored_identity() {
    let repo = InMemoryRepository::new();
    let config = AppConfig::default();
    let user = accounts::signup(&repo, "coach@example.com", PASSWORD, Role::Coach)
        .await
        .unwrap();

    let (logged_in, token) =
        accounts::login(&repo, &config.jwt_secret, "Coach@Example.com", PASSWORD)
            .await
            .unwrap();

    assert_eq!(logged_in, user);
    let claims = decode_token(&token, &config.jwt_secret).expect("token should verify");
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, Role::Coach);
    assert_eq!(claims.email, "coach@example.com");
    assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_identically() {
    let repo = InMemoryRepository::new();
    let config = AppConfig::default();
    accounts::signup(&repo, "coach@example.com", PASSWORD, Role::Coach)
        .await
        .unwrap();

    let wrong_password = accounts::login(&repo, &config.jwt_secret, "coach@example.com", "nope-nope")
        .await
        .unwrap_err();
    let unknown_email = accounts::login(&repo, &config.jwt_secret, "ghost@example.com", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown_email, AppError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let repo = InMemoryRepository::new();
    accounts::signup(&repo, "coach@example.com", PASSWORD, Role::Coach)
        .await
        .unwrap();
    let (_, token) = accounts::login(&repo, "first-secret", "coach@example.com", PASSWORD)
        .await
        .unwrap();

    assert!(decode_token(&token, "second-secret").is_none());
}

#[tokio::test]
async fn user_lookup_normalizes_email() {
    let repo = InMemoryRepository::new();
    let user = common::create_user(&repo, "winger@example.com", Role::Player).await;

    let found = users::find_user_by_email(&repo, " WINGER@example.com ").await.unwrap();
    assert_eq!(found, Some(user));

    let missing = users::find_user_by_email(&repo, "nobody@example.com").await.unwrap();
    assert!(missing.is_none());
}
