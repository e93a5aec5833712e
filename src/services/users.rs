//! User lookup for coaches building their squad.

use crate::{error::AppError, models::User, repository::Repository, services::normalize_email};

/// Finds a user by email (normalized). `None` is mapped to 404 by the handler.
pub async fn find_user_by_email(
    repo: &dyn Repository,
    email: &str,
) -> Result<Option<User>, AppError> {
    repo.find_user_by_email(&normalize_email(email)).await
}
