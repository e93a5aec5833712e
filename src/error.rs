use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// ErrorBody
///
/// The JSON shape of every error response: `{ "error": "<message>" }`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// AppError
///
/// Status-bearing error shared by services, repositories and handlers. Each variant maps
/// to exactly one HTTP status; the message is what the client sees, except for the
/// storage and internal variants which are logged and replaced with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// Login failure. Deliberately identical for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Too many requests, please try again later.")]
    TooManyRequests,
    #[error(transparent)]
    Database(sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized".to_string())
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden".to_string())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = ?e, "database error");
                "Something went wrong".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Unique and foreign-key violations are business-rule failures, not server faults, so
/// they surface as 400 with a message keyed by the violated constraint.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = db_err
                    .constraint()
                    .map(constraint_message)
                    .unwrap_or("Resource already exists");
                return AppError::BadRequest(message.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::BadRequest("Referenced resource does not exist".to_string());
            }
            if db_err.is_check_violation() {
                return AppError::BadRequest("Invalid value".to_string());
            }
        }
        AppError::Database(err)
    }
}

fn constraint_message(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "Email already registered",
        "squads_coach_id_key" => "Coach already owns a squad",
        "squad_members_squad_user_key" => "User is already a member of this squad",
        "lineup_players_lineup_user_key" => "Duplicate player in lineup",
        "lineup_players_lineup_order_key" => "Duplicate order slot in lineup",
        _ => "Resource already exists",
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::BadRequest(validation_message(&errors))
    }
}

/// Flattens field errors into a single readable sentence, preferring the custom messages
/// declared on the request DTOs.
fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();

    if messages.is_empty() {
        return errors.to_string();
    }
    messages.sort();
    messages.join("; ")
}
