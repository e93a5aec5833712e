//! Resource-level authorization.
//!
//! Role checks live in the extractors (`AuthUser`, `CoachUser`). Everything that depends
//! on a squad relationship goes through `authorize`, which takes the caller's identity,
//! the capability being exercised, and the caller's relation to the squad.

use uuid::Uuid;

use crate::{auth::AuthUser, error::AppError, models::Squad, repository::Repository};

/// What the caller wants to do with a squad or anything it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Mutate the squad, its fixtures, members or lineups. Owner only.
    ManageSquad,
    /// Read squad, fixture or lineup detail. Owner or member.
    ViewSquad,
}

/// The caller's relationship to one squad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquadRelation {
    pub coach_id: Uuid,
    pub is_member: bool,
}

impl SquadRelation {
    pub fn is_owner(&self, identity: &AuthUser) -> bool {
        identity.is_coach() && self.coach_id == identity.id
    }
}

/// Pure allow/deny decision.
pub fn is_allowed(identity: &AuthUser, capability: Capability, relation: &SquadRelation) -> bool {
    match capability {
        Capability::ManageSquad => relation.is_owner(identity),
        Capability::ViewSquad => relation.is_owner(identity) || relation.is_member,
    }
}

/// `is_allowed` as a `Result`, denying with 403.
pub fn authorize(
    identity: &AuthUser,
    capability: Capability,
    relation: &SquadRelation,
) -> Result<(), AppError> {
    if is_allowed(identity, capability, relation) {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

/// Loads the caller's relation to `squad` and authorizes against it. The membership
/// lookup is skipped when ownership already settles the question.
pub async fn authorize_squad(
    repo: &dyn Repository,
    identity: &AuthUser,
    capability: Capability,
    squad: &Squad,
) -> Result<(), AppError> {
    let mut relation = SquadRelation {
        coach_id: squad.coach_id,
        is_member: false,
    };
    if capability == Capability::ViewSquad && !relation.is_owner(identity) {
        relation.is_member = repo.is_member(squad.id, identity.id).await?;
    }
    authorize(identity, capability, &relation)
}

/// Resolves a squad by id (404 when absent) and authorizes the caller against it.
pub async fn load_authorized_squad(
    repo: &dyn Repository,
    identity: &AuthUser,
    capability: Capability,
    squad_id: Uuid,
) -> Result<Squad, AppError> {
    let squad = repo
        .get_squad(squad_id)
        .await?
        .ok_or_else(|| AppError::not_found("Squad not found"))?;
    authorize_squad(repo, identity, capability, &squad).await?;
    Ok(squad)
}
