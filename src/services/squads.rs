//! Squad ownership and membership.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Position, Role, Squad, SquadDetail, SquadMember},
    policy::{Capability, load_authorized_squad},
    repository::Repository,
    services::trimmed_within,
};

/// create_squad
///
/// One squad per coach. The lookup only gives an early, friendly error; the unique
/// constraint on `coach_id` decides when two requests race, and maps to the same message.
pub async fn create_squad(
    repo: &dyn Repository,
    coach_id: Uuid,
    name: &str,
) -> Result<Squad, AppError> {
    let name = trimmed_within(name, 2, 100, "Name must be between 2 and 100 characters")?;

    if repo.get_squad_by_coach(coach_id).await?.is_some() {
        return Err(AppError::bad_request("Coach already owns a squad"));
    }

    let squad = repo.create_squad(&name, coach_id).await?;
    tracing::info!(squad_id = %squad.id, %coach_id, "squad created");
    Ok(squad)
}

/// get_squad_detail
///
/// The squad and its members in join order. Owner or member only.
pub async fn get_squad_detail(
    repo: &dyn Repository,
    identity: &AuthUser,
    squad_id: Uuid,
) -> Result<SquadDetail, AppError> {
    let squad = load_authorized_squad(repo, identity, Capability::ViewSquad, squad_id).await?;
    let members = repo.list_members(squad.id).await?;

    Ok(SquadDetail {
        id: squad.id,
        name: squad.name,
        coach_id: squad.coach_id,
        created_at: squad.created_at,
        members,
    })
}

/// add_member
///
/// Adds an existing PLAYER to the caller's squad.
pub async fn add_member(
    repo: &dyn Repository,
    identity: &AuthUser,
    squad_id: Uuid,
    user_id: Uuid,
    preferred_position: Option<Position>,
) -> Result<SquadMember, AppError> {
    let squad = load_authorized_squad(repo, identity, Capability::ManageSquad, squad_id).await?;

    let user = repo
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::bad_request("User not found"))?;
    if user.role != Role::Player {
        return Err(AppError::bad_request("Only PLAYER users can be added to a squad"));
    }
    if repo.is_member(squad.id, user.id).await? {
        return Err(AppError::bad_request("User is already a member of this squad"));
    }

    let member = repo.add_member(squad.id, user.id, preferred_position).await?;
    tracing::info!(squad_id = %squad.id, user_id = %user.id, "member added");
    Ok(member)
}

/// get_squad_for_user
///
/// A coach's owned squad, or the squad of a player's earliest membership.
pub async fn get_squad_for_user(
    repo: &dyn Repository,
    identity: &AuthUser,
) -> Result<Option<Squad>, AppError> {
    match identity.role {
        Role::Coach => repo.get_squad_by_coach(identity.id).await,
        Role::Player => repo.get_first_squad_for_member(identity.id).await,
    }
}

/// delete_squad
///
/// Owner only. Fixtures, memberships, availability and lineups are removed with it.
pub async fn delete_squad(
    repo: &dyn Repository,
    identity: &AuthUser,
    squad_id: Uuid,
) -> Result<(), AppError> {
    let squad = load_authorized_squad(repo, identity, Capability::ManageSquad, squad_id).await?;
    if !repo.delete_squad(squad.id).await? {
        return Err(AppError::not_found("Squad not found"));
    }
    tracing::info!(squad_id = %squad.id, "squad deleted");
    Ok(())
}
