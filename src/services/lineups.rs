//! Fixture lineups: roster validation and atomic replacement.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{LineupSlot, LineupSlotRequest, LineupStatus, LineupView, Role},
    policy::Capability,
    repository::Repository,
    services::{fixtures::load_authorized_fixture, trim_optional},
};

/// Slots a single lineup may hold, starters and substitutes together.
pub const MAX_ROSTER: usize = 18;
/// Slots that may be flagged as starters.
pub const MAX_STARTERS: usize = 11;

/// Checks the roster's shape before any storage access: non-empty, bounded, no repeated
/// player or order slot, at most `MAX_STARTERS` starters.
pub fn validate_roster(players: &[LineupSlotRequest]) -> Result<Vec<LineupSlot>, AppError> {
    if players.is_empty() {
        return Err(AppError::bad_request("players is required"));
    }
    if players.len() > MAX_ROSTER {
        return Err(AppError::bad_request(format!(
            "Lineup cannot be more than {MAX_ROSTER} players"
        )));
    }

    let mut seen_users = HashSet::new();
    let mut seen_orders = HashSet::new();
    for player in players {
        if !seen_users.insert(player.user_id) {
            return Err(AppError::bad_request("Duplicate player in lineup"));
        }
        if !seen_orders.insert(player.order) {
            return Err(AppError::bad_request("Duplicate order slot in lineup"));
        }
    }

    if players.iter().filter(|p| p.starter).count() > MAX_STARTERS {
        return Err(AppError::bad_request(format!(
            "Lineup cannot have more than {MAX_STARTERS} starters"
        )));
    }

    Ok(players
        .iter()
        .map(|p| LineupSlot {
            user_id: p.user_id,
            position: p.position,
            order: p.order,
            starter: p.starter,
        })
        .collect())
}

/// save_lineup
///
/// Replaces the fixture's roster wholesale. The lineup keeps its status; the formation is
/// overwritten only when one is supplied. Nothing is written when any check fails.
pub async fn save_lineup(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
    formation: Option<String>,
    players: &[LineupSlotRequest],
) -> Result<LineupView, AppError> {
    let (fixture, squad) =
        load_authorized_fixture(repo, identity, Capability::ManageSquad, fixture_id).await?;

    let slots = validate_roster(players)?;

    for slot in &slots {
        let user = repo
            .get_user(slot.user_id)
            .await?
            .ok_or_else(|| AppError::bad_request("Player not found"))?;
        if user.role != Role::Player {
            return Err(AppError::bad_request("Only PLAYER users can be in the lineup"));
        }
        if !repo.is_member(squad.id, user.id).await? {
            return Err(AppError::bad_request("Player is not a member of this squad"));
        }
    }

    let lineup = repo
        .replace_lineup(fixture.id, trim_optional(formation), &slots)
        .await?;
    let players = repo.list_lineup_players(lineup.id).await?;

    tracing::info!(
        fixture_id = %fixture.id,
        lineup_id = %lineup.id,
        players = players.len(),
        "lineup saved"
    );
    Ok(LineupView::from_lineup(lineup, players))
}

/// get_lineup
///
/// A fixture without a saved lineup yields the empty view rather than an error.
pub async fn get_lineup(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
) -> Result<LineupView, AppError> {
    let (fixture, _) =
        load_authorized_fixture(repo, identity, Capability::ViewSquad, fixture_id).await?;

    match repo.get_lineup(fixture.id).await? {
        Some(lineup) => {
            let players = repo.list_lineup_players(lineup.id).await?;
            Ok(LineupView::from_lineup(lineup, players))
        }
        None => Ok(LineupView::empty(fixture.id)),
    }
}

pub async fn update_lineup_status(
    repo: &dyn Repository,
    identity: &AuthUser,
    fixture_id: Uuid,
    status: LineupStatus,
) -> Result<LineupView, AppError> {
    let (fixture, _) =
        load_authorized_fixture(repo, identity, Capability::ManageSquad, fixture_id).await?;

    let lineup = repo
        .set_lineup_status(fixture.id, status)
        .await?
        .ok_or_else(|| AppError::bad_request("Lineup not found for this fixture"))?;
    let players = repo.list_lineup_players(lineup.id).await?;

    tracing::info!(fixture_id = %fixture.id, status = %status, "lineup status changed");
    Ok(LineupView::from_lineup(lineup, players))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn slot(n: u128, order: i16, starter: bool) -> LineupSlotRequest {
        LineupSlotRequest {
            user_id: Uuid::from_u128(n),
            position: Position::Cm,
            order,
            starter,
        }
    }

    fn message(result: Result<Vec<LineupSlot>, AppError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert_eq!(message(validate_roster(&[])), "players is required");
    }

    #[test]
    fn roster_over_bound_is_rejected() {
        let players: Vec<_> = (1..=19).map(|n| slot(n, n as i16, false)).collect();
        assert_eq!(
            message(validate_roster(&players)),
            "Lineup cannot be more than 18 players"
        );
    }

    #[test]
    fn full_roster_with_eleven_starters_is_accepted() {
        let players: Vec<_> = (1..=18).map(|n| slot(n, n as i16, n <= 11)).collect();
        let slots = validate_roster(&players).unwrap();
        assert_eq!(slots.len(), 18);
        assert_eq!(slots.iter().filter(|s| s.starter).count(), 11);
    }

    #[test]
    fn twelve_starters_are_rejected() {
        let players: Vec<_> = (1..=12).map(|n| slot(n, n as i16, true)).collect();
        assert_eq!(
            message(validate_roster(&players)),
            "Lineup cannot have more than 11 starters"
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            message(validate_roster(&[slot(1, 1, false), slot(1, 2, false)])),
            "Duplicate player in lineup"
        );
        assert_eq!(
            message(validate_roster(&[slot(1, 3, false), slot(2, 3, false)])),
            "Duplicate order slot in lineup"
        );
    }
}
