//! Fixtures and per-fixture player availability.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{
        Availability, AvailabilityRecord, CreateFixtureRequest, Fixture, FixtureChanges,
        FixtureDetail, NewFixture, PlayerAvailability, Role, Squad, UpdateFixtureRequest,
    },
    policy::{Capability, authorize_squad, load_authorized_squad},
    repository::Repository,
    services::{trim_optional, trimmed_within},
};

const OPPONENT_MESSAGE: &str = "Opponent name must be between 2 and 100 characters";

/// Resolves a fixture (404 when absent) together with its squad, authorizing the caller
/// against the squad.
pub(crate) async fn load_authorized_fixture(
    repo: &dyn Repository,
    identity: &AuthUser,
    capability: Capability,
    fixture_id: Uuid,
) -> Result<(Fixture, Squad), AppError> {
    let fixture = repo
        .get_fixture(fixture_id)
        .await?
        .ok_or_else(|| AppError::not_found("Fixture not found"))?;
    let squad = repo
        .get_squad(fixture.squad_id)
        .await?
        .ok_or_else(|| AppError::not_found("Squad not found"))?;
    authorize_squad(repo, identity, capability, &squad).await?;
    Ok((fixture, squad))
}

/// create_fixture
///
/// Text fields are trimmed; blank location or notes are stored as null.
pub async fn create_fixture(
    repo: &dyn Repository,
    identity: &AuthUser,
    request: CreateFixtureRequest,
) -> Result<Fixture, AppError> {
    let squad =
        load_authorized_squad(repo, identity, Capability::ManageSquad, request.squad_id).await?;

    let fixture = repo
        .create_fixture(NewFixture {
            squad_id: squad.id,
            opponent: trimmed_within(&request.opponent, 2, 100, OPPONENT_MESSAGE)?,
            kickoff_at: request.kickoff_at,
            location: trim_optional(request.location),
            notes: trim_optional(request.notes),
        })
        .await?;

    tracing::info!(fixture_id = %fixture.id, squad_id = %squad.id, "fixture created");
    Ok(fixture)
}

/// get_fixture_detail
///
/// The fixture plus every PLAYER member of its squad with their answer, or `NO_RESPONSE`.
pub async fn get_fixture_detail(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
) -> Result<FixtureDetail, AppError> {
    let (fixture, squad) =
        load_authorized_fixture(repo, identity, Capability::ViewSquad, fixture_id).await?;

    let availability = repo
        .list_player_availability(fixture.id, squad.id)
        .await?
        .into_iter()
        .map(PlayerAvailability::from)
        .collect();

    Ok(FixtureDetail {
        fixture,
        availability,
    })
}

pub async fn list_fixtures_for_squad(
    repo: &dyn Repository,
    identity: &AuthUser,
    squad_id: Uuid,
) -> Result<Vec<Fixture>, AppError> {
    let squad = load_authorized_squad(repo, identity, Capability::ViewSquad, squad_id).await?;
    repo.list_fixtures(squad.id).await
}

/// Normalizes a partial update. Empty location or notes clear the column.
fn fixture_changes(request: UpdateFixtureRequest) -> Result<FixtureChanges, AppError> {
    if request.opponent.is_none()
        && request.kickoff_at.is_none()
        && request.location.is_none()
        && request.notes.is_none()
    {
        return Err(AppError::bad_request("At least one field is required"));
    }

    let opponent = match request.opponent {
        Some(opponent) => Some(trimmed_within(&opponent, 2, 100, OPPONENT_MESSAGE)?),
        None => None,
    };

    Ok(FixtureChanges {
        opponent,
        kickoff_at: request.kickoff_at,
        location: request.location.map(|v| trim_optional(Some(v))),
        notes: request.notes.map(|v| trim_optional(Some(v))),
    })
}

/// update_fixture
///
/// Partial update by the squad owner.
pub async fn update_fixture(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
    request: UpdateFixtureRequest,
) -> Result<Fixture, AppError> {
    let changes = fixture_changes(request)?;
    let (fixture, _) =
        load_authorized_fixture(repo, identity, Capability::ManageSquad, fixture_id).await?;

    let updated = repo
        .update_fixture(fixture.id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Fixture not found"))?;

    tracing::info!(fixture_id = %updated.id, "fixture updated");
    Ok(updated)
}

/// delete_fixture
///
/// Availability and lineup rows of the fixture are removed with it.
pub async fn delete_fixture(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
) -> Result<Uuid, AppError> {
    let (fixture, _) =
        load_authorized_fixture(repo, identity, Capability::ManageSquad, fixture_id).await?;

    if !repo.delete_fixture(fixture.id).await? {
        return Err(AppError::not_found("Fixture not found"));
    }
    tracing::info!(fixture_id = %fixture.id, "fixture deleted");
    Ok(fixture.id)
}

/// set_availability
///
/// A player always answers for themselves; any supplied `user_id` is ignored. A coach
/// answers on behalf of a named player and must own the fixture's squad. Either way the
/// target has to be a PLAYER member of that squad.
pub async fn set_availability(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
    target_user_id: Option<Uuid>,
    availability: Availability,
) -> Result<AvailabilityRecord, AppError> {
    let fixture = repo
        .get_fixture(fixture_id)
        .await?
        .ok_or_else(|| AppError::not_found("Fixture not found"))?;
    let squad = repo
        .get_squad(fixture.squad_id)
        .await?
        .ok_or_else(|| AppError::not_found("Squad not found"))?;

    let target = match identity.role {
        Role::Player => identity.id,
        Role::Coach => {
            authorize_squad(repo, identity, Capability::ManageSquad, &squad).await?;
            target_user_id
                .ok_or_else(|| AppError::bad_request("userId is required for coach updates"))?
        }
    };

    let is_player = matches!(
        repo.get_user(target).await?,
        Some(user) if user.role == Role::Player
    );
    if !is_player || !repo.is_member(squad.id, target).await? {
        return Err(AppError::forbidden());
    }

    let record = repo.upsert_availability(fixture.id, target, availability).await?;
    tracing::debug!(
        fixture_id = %fixture.id,
        user_id = %target,
        availability = %availability,
        "availability recorded"
    );
    Ok(record)
}
