use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    AppState,
    auth::CoachUser,
    error::{AppError, ErrorBody},
    extract::ApiJson,
    models::{FindUserRequest, User},
    services::{normalize_email, users},
};

/// lookup_user
///
/// [Coach Route] Finds a user by email so they can be added to a squad.
#[utoipa::path(
    post,
    path = "/users:lookup",
    request_body = FindUserRequest,
    responses(
        (status = 200, description = "User found", body = User),
        (status = 403, description = "Forbidden: Coach only", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn lookup_user(
    CoachUser(_coach): CoachUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FindUserRequest>,
) -> Result<Json<User>, AppError> {
    // Normalized before validation, so padded or mixed-case input is accepted.
    let payload = FindUserRequest {
        email: normalize_email(&payload.email),
    };
    payload.validate()?;
    let user = users::find_user_by_email(&*state.repo, &payload.email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}
