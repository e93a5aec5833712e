//! Signup and login.

use crate::{
    auth::issue_token,
    error::AppError,
    models::{Role, User},
    password::{hash_password_blocking, verify_password_blocking},
    repository::Repository,
    services::normalize_email,
};

/// signup
///
/// Stores the user with a normalized email and an Argon2id hash. A duplicate email
/// (after normalization) is rejected by the unique index as "Email already registered".
pub async fn signup(
    repo: &dyn Repository,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    let hash = hash_password_blocking(password.to_string()).await?;
    let user = repo.create_user(&email, &hash, role).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user signed up");
    Ok(user)
}

/// login
///
/// Returns the user and a freshly signed session token. Unknown email and wrong password
/// produce the same `InvalidCredentials` error.
pub async fn login(
    repo: &dyn Repository,
    jwt_secret: &str,
    email: &str,
    password: &str,
) -> Result<(User, String), AppError> {
    let email = normalize_email(email);
    let Some(credentials) = repo.find_credentials_by_email(&email).await? else {
        return Err(AppError::InvalidCredentials);
    };

    let matches =
        verify_password_blocking(password.to_string(), credentials.password_hash.clone()).await?;
    if !matches {
        return Err(AppError::InvalidCredentials);
    }

    let user = credentials.user();
    let token = issue_token(&user, jwt_secret)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}
