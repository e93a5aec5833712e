//! Domain services.
//!
//! Each service wraps a narrow set of repository calls with the business rules for its
//! resource. Services take the repository as `&dyn Repository` and the caller as an
//! explicit `AuthUser` (or id); they never see HTTP types.

pub mod accounts;
pub mod fixtures;
pub mod lineups;
pub mod squads;
pub mod users;

/// Trims surrounding whitespace and lowercases, so lookups and the unique index agree.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims an optional text field, mapping blank input to `None`.
pub(crate) fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims a required text field and enforces its length in characters.
pub(crate) fn trimmed_within(
    value: &str,
    min: usize,
    max: usize,
    message: &str,
) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(crate::error::AppError::bad_request(message));
    }
    Ok(trimmed.to_string())
}
