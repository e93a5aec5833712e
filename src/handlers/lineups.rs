use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, CoachUser},
    error::{AppError, ErrorBody},
    extract::{ApiJson, ApiPath},
    models::{LineupView, SaveLineupRequest, UpdateLineupStatusRequest},
    services::lineups,
};

/// save_lineup
///
/// [Coach Route] Replaces the fixture's roster in one transaction.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/lineup",
    params(("id" = Uuid, Path, description = "Fixture id")),
    request_body = SaveLineupRequest,
    responses(
        (status = 201, description = "Lineup saved", body = LineupView),
        (status = 400, description = "Roster rejected", body = ErrorBody),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn save_lineup(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<SaveLineupRequest>,
) -> Result<(StatusCode, Json<LineupView>), AppError> {
    payload.validate()?;
    let view =
        lineups::save_lineup(&*state.repo, &coach, id, payload.formation, &payload.players).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// get_lineup
///
/// [Authenticated Route] The fixture's lineup, or the empty shape when none is saved.
#[utoipa::path(
    get,
    path = "/fixtures/{id}/lineup",
    params(("id" = Uuid, Path, description = "Fixture id")),
    responses(
        (status = 200, description = "Lineup", body = LineupView),
        (status = 403, description = "Not owner or member", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn get_lineup(
    identity: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LineupView>, AppError> {
    let view = lineups::get_lineup(&*state.repo, &identity, id).await?;
    Ok(Json(view))
}

#[utoipa::path(
    patch,
    path = "/fixtures/{id}/lineup/status",
    params(("id" = Uuid, Path, description = "Fixture id")),
    request_body = UpdateLineupStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = LineupView),
        (status = 400, description = "Lineup not found for this fixture", body = ErrorBody),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn update_lineup_status(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateLineupStatusRequest>,
) -> Result<Json<LineupView>, AppError> {
    let view = lineups::update_lineup_status(&*state.repo, &coach, id, payload.status).await?;
    Ok(Json(view))
}
