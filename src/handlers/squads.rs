use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, CoachUser},
    error::{AppError, ErrorBody},
    extract::{ApiJson, ApiPath},
    models::{AddMemberRequest, CreateSquadRequest, Squad, SquadDetail, SquadMember},
    services::squads,
};

/// create_squad
///
/// [Coach Route] Creates the caller's squad. A coach owns at most one.
#[utoipa::path(
    post,
    path = "/squads",
    request_body = CreateSquadRequest,
    responses(
        (status = 201, description = "Squad created", body = Squad),
        (status = 400, description = "Invalid name or coach already owns a squad", body = ErrorBody),
        (status = 403, description = "Forbidden: Coach only", body = ErrorBody)
    )
)]
pub async fn create_squad(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSquadRequest>,
) -> Result<(StatusCode, Json<Squad>), AppError> {
    payload.validate()?;
    let squad = squads::create_squad(&*state.repo, coach.id, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(squad)))
}

/// get_squad
///
/// [Authenticated Route] Squad detail with members in join order. Owner or member only.
#[utoipa::path(
    get,
    path = "/squads/{id}",
    params(("id" = Uuid, Path, description = "Squad id")),
    responses(
        (status = 200, description = "Squad detail", body = SquadDetail),
        (status = 403, description = "Not owner or member", body = ErrorBody),
        (status = 404, description = "Squad not found", body = ErrorBody)
    )
)]
pub async fn get_squad(
    identity: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SquadDetail>, AppError> {
    let detail = squads::get_squad_detail(&*state.repo, &identity, id).await?;
    Ok(Json(detail))
}

/// delete_squad
///
/// [Coach Route] Deletes the caller's squad and everything scheduled under it.
#[utoipa::path(
    delete,
    path = "/squads/{id}",
    params(("id" = Uuid, Path, description = "Squad id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Squad not found", body = ErrorBody)
    )
)]
pub async fn delete_squad(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    squads::delete_squad(&*state.repo, &coach, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// add_member
///
/// [Coach Route] Adds an existing PLAYER to the caller's squad.
#[utoipa::path(
    post,
    path = "/squads/{id}/members",
    params(("id" = Uuid, Path, description = "Squad id")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = SquadMember),
        (status = 400, description = "Unknown user, not a PLAYER, or already a member", body = ErrorBody),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Squad not found", body = ErrorBody)
    )
)]
pub async fn add_member(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<SquadMember>), AppError> {
    payload.validate()?;
    let member = squads::add_member(
        &*state.repo,
        &coach,
        id,
        payload.user_id,
        payload.preferred_position,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// get_my_squad
///
/// [Authenticated Route] The caller's squad, or `null` when they have none.
#[utoipa::path(
    get,
    path = "/me/squad",
    responses((status = 200, description = "Caller's squad or null", body = Squad))
)]
pub async fn get_my_squad(
    identity: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Option<Squad>>, AppError> {
    let squad = squads::get_squad_for_user(&*state.repo, &identity).await?;
    Ok(Json(squad))
}
