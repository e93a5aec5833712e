use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, CoachUser},
    error::{AppError, ErrorBody},
    extract::{ApiJson, ApiPath},
    models::{
        AvailabilityRecord, CreateFixtureRequest, DeletedResponse, Fixture, FixtureDetail,
        SetAvailabilityRequest, UpdateFixtureRequest,
    },
    services::fixtures,
};

/// create_fixture
///
/// [Coach Route] Schedules a fixture for a squad the caller owns.
#[utoipa::path(
    post,
    path = "/fixtures",
    request_body = CreateFixtureRequest,
    responses(
        (status = 201, description = "Fixture created", body = Fixture),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Squad not found", body = ErrorBody)
    )
)]
pub async fn create_fixture(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateFixtureRequest>,
) -> Result<(StatusCode, Json<Fixture>), AppError> {
    payload.validate()?;
    let fixture = fixtures::create_fixture(&*state.repo, &coach, payload).await?;
    Ok((StatusCode::CREATED, Json(fixture)))
}

/// get_fixture
///
/// [Authenticated Route] Fixture detail with every squad player's availability.
#[utoipa::path(
    get,
    path = "/fixtures/{id}",
    params(("id" = Uuid, Path, description = "Fixture id")),
    responses(
        (status = 200, description = "Fixture detail", body = FixtureDetail),
        (status = 403, description = "Not owner or member", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn get_fixture(
    identity: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FixtureDetail>, AppError> {
    let detail = fixtures::get_fixture_detail(&*state.repo, &identity, id).await?;
    Ok(Json(detail))
}

/// update_fixture
///
/// [Coach Route] Partial update. Empty location or notes clear the field.
#[utoipa::path(
    patch,
    path = "/fixtures/{id}",
    params(("id" = Uuid, Path, description = "Fixture id")),
    request_body = UpdateFixtureRequest,
    responses(
        (status = 200, description = "Fixture updated", body = Fixture),
        (status = 400, description = "No field supplied or invalid input", body = ErrorBody),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn update_fixture(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateFixtureRequest>,
) -> Result<Json<Fixture>, AppError> {
    payload.validate()?;
    let fixture = fixtures::update_fixture(&*state.repo, &coach, id, payload).await?;
    Ok(Json(fixture))
}

/// delete_fixture
///
/// [Coach Route] Removes the fixture with its availability and lineup.
#[utoipa::path(
    delete,
    path = "/fixtures/{id}",
    params(("id" = Uuid, Path, description = "Fixture id")),
    responses(
        (status = 200, description = "Deleted", body = DeletedResponse),
        (status = 403, description = "Not owner", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn delete_fixture(
    CoachUser(coach): CoachUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    let id = fixtures::delete_fixture(&*state.repo, &coach, id).await?;
    Ok(Json(DeletedResponse { ok: true, id }))
}

/// list_squad_fixtures
///
/// [Authenticated Route] A squad's fixtures, earliest kickoff first.
#[utoipa::path(
    get,
    path = "/squads/{id}/fixtures",
    params(("id" = Uuid, Path, description = "Squad id")),
    responses(
        (status = 200, description = "Fixtures", body = [Fixture]),
        (status = 403, description = "Not owner or member", body = ErrorBody),
        (status = 404, description = "Squad not found", body = ErrorBody)
    )
)]
pub async fn list_squad_fixtures(
    identity: AuthUser,
    State(state): State<AppState>,
    ApiPath(squad_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Fixture>>, AppError> {
    let list = fixtures::list_fixtures_for_squad(&*state.repo, &identity, squad_id).await?;
    Ok(Json(list))
}

/// set_availability
///
/// [Authenticated Route] Players answer for themselves; coaches answer for a named player.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/availability",
    params(("id" = Uuid, Path, description = "Fixture id")),
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability recorded", body = AvailabilityRecord),
        (status = 400, description = "userId missing on a coach update", body = ErrorBody),
        (status = 403, description = "Not entitled for this squad or player", body = ErrorBody),
        (status = 404, description = "Fixture not found", body = ErrorBody)
    )
)]
pub async fn set_availability(
    identity: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<SetAvailabilityRequest>,
) -> Result<Json<AvailabilityRecord>, AppError> {
    let record = fixtures::set_availability(
        &*state.repo,
        &identity,
        id,
        payload.user_id,
        payload.availability,
    )
    .await?;
    Ok(Json(record))
}
