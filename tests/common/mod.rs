#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use squad_manager::{
    AppConfig, AppState,
    auth::AuthUser,
    error::AppError,
    models::{
        Availability, AvailabilityRecord, Fixture, FixtureChanges, Lineup, LineupPlayer,
        LineupSlot, LineupStatus, NewFixture, PlayerAvailabilityRow, Position, Role, Squad,
        SquadMember, User, UserCredentials,
    },
    repository::{RepoResult, Repository, RepositoryState},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY ---

#[derive(Clone)]
struct MemberRow {
    id: Uuid,
    squad_id: Uuid,
    user_id: Uuid,
    preferred_position: Option<Position>,
    joined_at: chrono::DateTime<Utc>,
}

#[derive(Clone, Default)]
struct Store {
    users: Vec<UserCredentials>,
    squads: Vec<Squad>,
    members: Vec<MemberRow>,
    fixtures: Vec<Fixture>,
    availability: Vec<AvailabilityRecord>,
    lineups: Vec<Lineup>,
    lineup_slots: Vec<(Uuid, LineupSlot)>,
}

/// Repository backed by plain vectors. It mirrors the Postgres schema's unique
/// constraints and cascades, and applies a lineup replacement all-or-nothing.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    /// When set, the next lineup replacement fails after partially applying its writes
    /// to a scratch copy, leaving the stored roster untouched.
    pub fail_lineup_write: AtomicBool,
    /// When set, `ping` reports the store as unreachable.
    pub offline: AtomicBool,
}

fn unique(message: &str) -> AppError {
    AppError::bad_request(message)
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("store lock poisoned")
    }

    pub fn member_count(&self, squad_id: Uuid) -> usize {
        self.store().members.iter().filter(|m| m.squad_id == squad_id).count()
    }

    pub fn fixture_count(&self, squad_id: Uuid) -> usize {
        self.store().fixtures.iter().filter(|f| f.squad_id == squad_id).count()
    }

    pub fn availability_rows(&self, fixture_id: Uuid) -> Vec<AvailabilityRecord> {
        self.store()
            .availability
            .iter()
            .filter(|a| a.fixture_id == fixture_id)
            .cloned()
            .collect()
    }

    pub fn lineup_slot_count(&self) -> usize {
        self.store().lineup_slots.len()
    }

    pub fn lineup_count(&self) -> usize {
        self.store().lineups.len()
    }

    pub fn stored_email(&self, id: Uuid) -> Option<String> {
        self.store().users.iter().find(|u| u.id == id).map(|u| u.email.clone())
    }
}

fn member_view(store: &Store, row: &MemberRow) -> Option<SquadMember> {
    let user = store.users.iter().find(|u| u.id == row.user_id)?;
    Some(SquadMember {
        id: row.id,
        squad_id: row.squad_id,
        user_id: row.user_id,
        email: user.email.clone(),
        role: user.role,
        preferred_position: row.preferred_position,
        joined_at: row.joined_at,
    })
}

fn delete_fixture_rows(store: &mut Store, fixture_id: Uuid) {
    store.availability.retain(|a| a.fixture_id != fixture_id);
    let lineup_ids: Vec<Uuid> = store
        .lineups
        .iter()
        .filter(|l| l.fixture_id == fixture_id)
        .map(|l| l.id)
        .collect();
    store.lineup_slots.retain(|(id, _)| !lineup_ids.contains(id));
    store.lineups.retain(|l| l.fixture_id != fixture_id);
    store.fixtures.retain(|f| f.id != fixture_id);
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn ping(&self) -> RepoResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> RepoResult<User> {
        let mut store = self.store();
        if store.users.iter().any(|u| u.email == email) {
            return Err(unique("Email already registered"));
        }
        let row = UserCredentials {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            password_hash: password_hash.to_string(),
        };
        let user = row.user();
        store.users.push(row);
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.store().users.iter().find(|u| u.id == id).map(UserCredentials::user))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .store()
            .users
            .iter()
            .find(|u| u.email == email)
            .map(UserCredentials::user))
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        Ok(self.store().users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_squad(&self, name: &str, coach_id: Uuid) -> RepoResult<Squad> {
        let mut store = self.store();
        if store.squads.iter().any(|s| s.coach_id == coach_id) {
            return Err(unique("Coach already owns a squad"));
        }
        let squad = Squad {
            id: Uuid::new_v4(),
            name: name.to_string(),
            coach_id,
            created_at: Utc::now(),
        };
        store.squads.push(squad.clone());
        Ok(squad)
    }

    async fn get_squad(&self, id: Uuid) -> RepoResult<Option<Squad>> {
        Ok(self.store().squads.iter().find(|s| s.id == id).cloned())
    }

    async fn get_squad_by_coach(&self, coach_id: Uuid) -> RepoResult<Option<Squad>> {
        Ok(self.store().squads.iter().find(|s| s.coach_id == coach_id).cloned())
    }

    async fn get_first_squad_for_member(&self, user_id: Uuid) -> RepoResult<Option<Squad>> {
        let store = self.store();
        let first = store.members.iter().find(|m| m.user_id == user_id);
        Ok(first.and_then(|m| store.squads.iter().find(|s| s.id == m.squad_id).cloned()))
    }

    async fn delete_squad(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store();
        if !store.squads.iter().any(|s| s.id == id) {
            return Ok(false);
        }
        let fixture_ids: Vec<Uuid> = store
            .fixtures
            .iter()
            .filter(|f| f.squad_id == id)
            .map(|f| f.id)
            .collect();
        for fixture_id in fixture_ids {
            delete_fixture_rows(&mut store, fixture_id);
        }
        store.members.retain(|m| m.squad_id != id);
        store.squads.retain(|s| s.id != id);
        Ok(true)
    }

    async fn list_members(&self, squad_id: Uuid) -> RepoResult<Vec<SquadMember>> {
        let store = self.store();
        Ok(store
            .members
            .iter()
            .filter(|m| m.squad_id == squad_id)
            .filter_map(|m| member_view(&store, m))
            .collect())
    }

    async fn is_member(&self, squad_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(self
            .store()
            .members
            .iter()
            .any(|m| m.squad_id == squad_id && m.user_id == user_id))
    }

    async fn add_member(
        &self,
        squad_id: Uuid,
        user_id: Uuid,
        preferred_position: Option<Position>,
    ) -> RepoResult<SquadMember> {
        let mut store = self.store();
        if store
            .members
            .iter()
            .any(|m| m.squad_id == squad_id && m.user_id == user_id)
        {
            return Err(unique("User is already a member of this squad"));
        }
        // Join order must be strictly increasing even within one clock tick.
        let joined_at = store
            .members
            .last()
            .map(|m| m.joined_at + Duration::milliseconds(1))
            .unwrap_or_else(Utc::now)
            .max(Utc::now());
        let row = MemberRow {
            id: Uuid::new_v4(),
            squad_id,
            user_id,
            preferred_position,
            joined_at,
        };
        store.members.push(row.clone());
        member_view(&store, &row)
            .ok_or_else(|| AppError::bad_request("Referenced resource does not exist"))
    }

    async fn create_fixture(&self, fixture: NewFixture) -> RepoResult<Fixture> {
        let created = Fixture {
            id: Uuid::new_v4(),
            squad_id: fixture.squad_id,
            opponent: fixture.opponent,
            kickoff_at: fixture.kickoff_at,
            location: fixture.location,
            notes: fixture.notes,
            created_at: Utc::now(),
        };
        self.store().fixtures.push(created.clone());
        Ok(created)
    }

    async fn get_fixture(&self, id: Uuid) -> RepoResult<Option<Fixture>> {
        Ok(self.store().fixtures.iter().find(|f| f.id == id).cloned())
    }

    async fn list_fixtures(&self, squad_id: Uuid) -> RepoResult<Vec<Fixture>> {
        let mut fixtures: Vec<Fixture> = self
            .store()
            .fixtures
            .iter()
            .filter(|f| f.squad_id == squad_id)
            .cloned()
            .collect();
        fixtures.sort_by_key(|f| f.kickoff_at);
        Ok(fixtures)
    }

    async fn update_fixture(&self, id: Uuid, changes: FixtureChanges) -> RepoResult<Option<Fixture>> {
        let mut store = self.store();
        let Some(fixture) = store.fixtures.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(opponent) = changes.opponent {
            fixture.opponent = opponent;
        }
        if let Some(kickoff_at) = changes.kickoff_at {
            fixture.kickoff_at = kickoff_at;
        }
        if let Some(location) = changes.location {
            fixture.location = location;
        }
        if let Some(notes) = changes.notes {
            fixture.notes = notes;
        }
        Ok(Some(fixture.clone()))
    }

    async fn delete_fixture(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.store();
        if !store.fixtures.iter().any(|f| f.id == id) {
            return Ok(false);
        }
        delete_fixture_rows(&mut store, id);
        Ok(true)
    }

    async fn upsert_availability(
        &self,
        fixture_id: Uuid,
        user_id: Uuid,
        availability: Availability,
    ) -> RepoResult<AvailabilityRecord> {
        let mut store = self.store();
        let now = Utc::now();
        if let Some(existing) = store
            .availability
            .iter_mut()
            .find(|a| a.fixture_id == fixture_id && a.user_id == user_id)
        {
            existing.availability = availability;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let record = AvailabilityRecord {
            fixture_id,
            user_id,
            availability,
            updated_at: now,
        };
        store.availability.push(record.clone());
        Ok(record)
    }

    async fn list_player_availability(
        &self,
        fixture_id: Uuid,
        squad_id: Uuid,
    ) -> RepoResult<Vec<PlayerAvailabilityRow>> {
        let store = self.store();
        Ok(store
            .members
            .iter()
            .filter(|m| m.squad_id == squad_id)
            .filter_map(|m| {
                let user = store.users.iter().find(|u| u.id == m.user_id)?;
                if user.role != Role::Player {
                    return None;
                }
                let answer = store
                    .availability
                    .iter()
                    .find(|a| a.fixture_id == fixture_id && a.user_id == m.user_id)
                    .map(|a| a.availability);
                Some(PlayerAvailabilityRow {
                    user_id: m.user_id,
                    email: user.email.clone(),
                    preferred_position: m.preferred_position,
                    availability: answer,
                })
            })
            .collect())
    }

    async fn replace_lineup(
        &self,
        fixture_id: Uuid,
        formation: Option<String>,
        slots: &[LineupSlot],
    ) -> RepoResult<Lineup> {
        let mut store = self.store();
        let mut scratch = store.clone();

        let lineup = match scratch.lineups.iter_mut().find(|l| l.fixture_id == fixture_id) {
            Some(existing) => {
                if formation.is_some() {
                    existing.formation = formation;
                }
                existing.clone()
            }
            None => {
                let created = Lineup {
                    id: Uuid::new_v4(),
                    fixture_id,
                    status: LineupStatus::Draft,
                    formation,
                };
                scratch.lineups.push(created.clone());
                created
            }
        };

        scratch.lineup_slots.retain(|(id, _)| *id != lineup.id);
        for (index, slot) in slots.iter().enumerate() {
            if index > 0 && self.fail_lineup_write.swap(false, Ordering::SeqCst) {
                return Err(AppError::Database(sqlx::Error::WorkerCrashed));
            }
            scratch.lineup_slots.push((lineup.id, slot.clone()));
        }

        *store = scratch;
        Ok(lineup)
    }

    async fn get_lineup(&self, fixture_id: Uuid) -> RepoResult<Option<Lineup>> {
        Ok(self
            .store()
            .lineups
            .iter()
            .find(|l| l.fixture_id == fixture_id)
            .cloned())
    }

    async fn list_lineup_players(&self, lineup_id: Uuid) -> RepoResult<Vec<LineupPlayer>> {
        let store = self.store();
        let mut players: Vec<LineupPlayer> = store
            .lineup_slots
            .iter()
            .filter(|(id, _)| *id == lineup_id)
            .filter_map(|(_, slot)| {
                let user = store.users.iter().find(|u| u.id == slot.user_id)?;
                Some(LineupPlayer {
                    user_id: slot.user_id,
                    email: user.email.clone(),
                    position: slot.position,
                    order: slot.order,
                    starter: slot.starter,
                })
            })
            .collect();
        players.sort_by_key(|p| p.order);
        Ok(players)
    }

    async fn set_lineup_status(
        &self,
        fixture_id: Uuid,
        status: LineupStatus,
    ) -> RepoResult<Option<Lineup>> {
        let mut store = self.store();
        Ok(store
            .lineups
            .iter_mut()
            .find(|l| l.fixture_id == fixture_id)
            .map(|l| {
                l.status = status;
                l.clone()
            }))
    }
}

// --- Helpers ---

pub fn identity(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

/// Inserts a user directly, skipping password hashing.
pub async fn create_user(repo: &InMemoryRepository, email: &str, role: Role) -> User {
    repo.create_user(email, "not-a-real-hash", role)
        .await
        .expect("create user")
}

/// A coach who owns a squad, plus one PLAYER member.
pub struct SquadFixture {
    pub coach: AuthUser,
    pub player: AuthUser,
    pub squad: Squad,
}

pub async fn squad_with_player(repo: &InMemoryRepository) -> SquadFixture {
    let coach = create_user(repo, "coach@example.com", Role::Coach).await;
    let player = create_user(repo, "player@example.com", Role::Player).await;
    let squad = repo.create_squad("U12s", coach.id).await.expect("squad");
    repo.add_member(squad.id, player.id, Some(Position::Lw))
        .await
        .expect("member");
    SquadFixture {
        coach: identity(&coach),
        player: identity(&player),
        squad,
    }
}

pub async fn create_fixture(repo: &InMemoryRepository, squad_id: Uuid) -> Fixture {
    repo.create_fixture(NewFixture {
        squad_id,
        opponent: "Riverside".to_string(),
        kickoff_at: Utc::now() + Duration::days(7),
        location: None,
        notes: None,
    })
    .await
    .expect("fixture")
}

pub fn app_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState::new(repo as RepositoryState, AppConfig::default())
}
