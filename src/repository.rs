use crate::{
    error::AppError,
    models::{
        Availability, AvailabilityRecord, Fixture, FixtureChanges, Lineup, LineupPlayer,
        LineupSlot, LineupStatus, NewFixture, PlayerAvailabilityRow, Position, Role, Squad,
        SquadMember, User, UserCredentials,
    },
};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, AppError>;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Services depend on this trait
/// only, so the Postgres implementation can be swapped for an in-memory one in tests.
///
/// Storage constraint violations are reported as `AppError::BadRequest` with a message
/// naming the violated rule; every other storage failure is `AppError::Database`.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Round-trips to the store. Used by the readiness probe.
    async fn ping(&self) -> RepoResult<()>;

    // --- Users ---
    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> RepoResult<User>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>>;

    // --- Squads & Membership ---
    async fn create_squad(&self, name: &str, coach_id: Uuid) -> RepoResult<Squad>;
    async fn get_squad(&self, id: Uuid) -> RepoResult<Option<Squad>>;
    async fn get_squad_by_coach(&self, coach_id: Uuid) -> RepoResult<Option<Squad>>;
    // Squad of the user's earliest membership.
    async fn get_first_squad_for_member(&self, user_id: Uuid) -> RepoResult<Option<Squad>>;
    async fn delete_squad(&self, id: Uuid) -> RepoResult<bool>;
    // Members ordered by join time.
    async fn list_members(&self, squad_id: Uuid) -> RepoResult<Vec<SquadMember>>;
    async fn is_member(&self, squad_id: Uuid, user_id: Uuid) -> RepoResult<bool>;
    async fn add_member(
        &self,
        squad_id: Uuid,
        user_id: Uuid,
        preferred_position: Option<Position>,
    ) -> RepoResult<SquadMember>;

    // --- Fixtures ---
    async fn create_fixture(&self, fixture: NewFixture) -> RepoResult<Fixture>;
    async fn get_fixture(&self, id: Uuid) -> RepoResult<Option<Fixture>>;
    // Ordered by kickoff, earliest first.
    async fn list_fixtures(&self, squad_id: Uuid) -> RepoResult<Vec<Fixture>>;
    async fn update_fixture(&self, id: Uuid, changes: FixtureChanges) -> RepoResult<Option<Fixture>>;
    async fn delete_fixture(&self, id: Uuid) -> RepoResult<bool>;

    // --- Availability ---
    async fn upsert_availability(
        &self,
        fixture_id: Uuid,
        user_id: Uuid,
        availability: Availability,
    ) -> RepoResult<AvailabilityRecord>;
    // Every PLAYER member of the squad, left-joined against their answer for the fixture.
    async fn list_player_availability(
        &self,
        fixture_id: Uuid,
        squad_id: Uuid,
    ) -> RepoResult<Vec<PlayerAvailabilityRow>>;

    // --- Lineups ---
    /// Atomically replaces the fixture's roster: creates the lineup row if needed (status
    /// kept, formation overwritten when supplied), deletes every existing slot and inserts
    /// `slots`. Nothing is written unless every step succeeds.
    async fn replace_lineup(
        &self,
        fixture_id: Uuid,
        formation: Option<String>,
        slots: &[LineupSlot],
    ) -> RepoResult<Lineup>;
    async fn get_lineup(&self, fixture_id: Uuid) -> RepoResult<Option<Lineup>>;
    // Ordered by order index.
    async fn list_lineup_players(&self, lineup_id: Uuid) -> RepoResult<Vec<LineupPlayer>>;
    async fn set_lineup_status(
        &self,
        fixture_id: Uuid,
        status: LineupStatus,
    ) -> RepoResult<Option<Lineup>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The lineup write steps. Runs on the caller's transaction connection; the caller
    /// decides whether to commit or roll back.
    async fn write_lineup(
        conn: &mut PgConnection,
        fixture_id: Uuid,
        formation: Option<String>,
        slots: &[LineupSlot],
    ) -> RepoResult<Lineup> {
        let lineup = sqlx::query_as::<_, Lineup>(
            r#"
            INSERT INTO lineups (fixture_id, formation)
            VALUES ($1, $2)
            ON CONFLICT (fixture_id) DO UPDATE
                SET formation = COALESCE(EXCLUDED.formation, lineups.formation),
                    updated_at = NOW()
            RETURNING id, fixture_id, status, formation
            "#,
        )
        .bind(fixture_id)
        .bind(formation)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM lineup_players WHERE lineup_id = $1")
            .bind(lineup.id)
            .execute(&mut *conn)
            .await?;

        for slot in slots {
            sqlx::query(
                r#"
                INSERT INTO lineup_players (lineup_id, user_id, position, order_index, starter)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(lineup.id)
            .bind(slot.user_id)
            .bind(slot.position)
            .bind(slot.order)
            .bind(slot.starter)
            .execute(&mut *conn)
            .await?;
        }

        Ok(lineup)
    }
}

const SQUAD_COLUMNS: &str = "id, name, coach_id, created_at";
const FIXTURE_COLUMNS: &str = "id, squad_id, opponent, kickoff_at, location, notes, created_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// create_user
    ///
    /// The unique index on `email` is the duplicate check; a violation maps to
    /// "Email already registered".
    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3) RETURNING id, email, role",
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }

    // --- SQUADS ---

    async fn create_squad(&self, name: &str, coach_id: Uuid) -> RepoResult<Squad> {
        let squad = sqlx::query_as::<_, Squad>(&format!(
            "INSERT INTO squads (name, coach_id) VALUES ($1, $2) RETURNING {SQUAD_COLUMNS}"
        ))
        .bind(name)
        .bind(coach_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(squad)
    }

    async fn get_squad(&self, id: Uuid) -> RepoResult<Option<Squad>> {
        let squad = sqlx::query_as::<_, Squad>(&format!(
            "SELECT {SQUAD_COLUMNS} FROM squads WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(squad)
    }

    async fn get_squad_by_coach(&self, coach_id: Uuid) -> RepoResult<Option<Squad>> {
        let squad = sqlx::query_as::<_, Squad>(&format!(
            "SELECT {SQUAD_COLUMNS} FROM squads WHERE coach_id = $1"
        ))
        .bind(coach_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(squad)
    }

    async fn get_first_squad_for_member(&self, user_id: Uuid) -> RepoResult<Option<Squad>> {
        let squad = sqlx::query_as::<_, Squad>(
            r#"
            SELECT s.id, s.name, s.coach_id, s.created_at
            FROM squad_members m
            JOIN squads s ON s.id = m.squad_id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(squad)
    }

    /// delete_squad
    ///
    /// Fixtures, memberships, availability and lineups go with it via ON DELETE CASCADE.
    async fn delete_squad(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM squads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_members(&self, squad_id: Uuid) -> RepoResult<Vec<SquadMember>> {
        let members = sqlx::query_as::<_, SquadMember>(
            r#"
            SELECT m.id, m.squad_id, m.user_id, u.email, u.role,
                   m.preferred_position, m.created_at AS joined_at
            FROM squad_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.squad_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(squad_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn is_member(&self, squad_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM squad_members WHERE squad_id = $1 AND user_id = $2)",
        )
        .bind(squad_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// add_member
    ///
    /// Uses a CTE to insert the membership and join the member's email in one round trip.
    async fn add_member(
        &self,
        squad_id: Uuid,
        user_id: Uuid,
        preferred_position: Option<Position>,
    ) -> RepoResult<SquadMember> {
        let member = sqlx::query_as::<_, SquadMember>(
            r#"
            WITH inserted AS (
                INSERT INTO squad_members (squad_id, user_id, preferred_position)
                VALUES ($1, $2, $3)
                RETURNING id, squad_id, user_id, preferred_position, created_at
            )
            SELECT i.id, i.squad_id, i.user_id, u.email, u.role,
                   i.preferred_position, i.created_at AS joined_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(squad_id)
        .bind(user_id)
        .bind(preferred_position)
        .fetch_one(&self.pool)
        .await?;
        Ok(member)
    }

    // --- FIXTURES ---

    async fn create_fixture(&self, fixture: NewFixture) -> RepoResult<Fixture> {
        let created = sqlx::query_as::<_, Fixture>(&format!(
            r#"
            INSERT INTO fixtures (squad_id, opponent, kickoff_at, location, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {FIXTURE_COLUMNS}
            "#
        ))
        .bind(fixture.squad_id)
        .bind(fixture.opponent)
        .bind(fixture.kickoff_at)
        .bind(fixture.location)
        .bind(fixture.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_fixture(&self, id: Uuid) -> RepoResult<Option<Fixture>> {
        let fixture = sqlx::query_as::<_, Fixture>(&format!(
            "SELECT {FIXTURE_COLUMNS} FROM fixtures WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fixture)
    }

    async fn list_fixtures(&self, squad_id: Uuid) -> RepoResult<Vec<Fixture>> {
        let fixtures = sqlx::query_as::<_, Fixture>(&format!(
            "SELECT {FIXTURE_COLUMNS} FROM fixtures WHERE squad_id = $1 ORDER BY kickoff_at ASC, id ASC"
        ))
        .bind(squad_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fixtures)
    }

    /// update_fixture
    ///
    /// `COALESCE` keeps columns whose change is absent. The optional text columns carry
    /// an explicit "supplied" flag so they can also be cleared to NULL.
    async fn update_fixture(&self, id: Uuid, changes: FixtureChanges) -> RepoResult<Option<Fixture>> {
        let (set_location, location) = match changes.location {
            Some(value) => (true, value),
            None => (false, None),
        };
        let (set_notes, notes) = match changes.notes {
            Some(value) => (true, value),
            None => (false, None),
        };

        let fixture = sqlx::query_as::<_, Fixture>(&format!(
            r#"
            UPDATE fixtures
            SET opponent = COALESCE($2, opponent),
                kickoff_at = COALESCE($3, kickoff_at),
                location = CASE WHEN $4 THEN $5 ELSE location END,
                notes = CASE WHEN $6 THEN $7 ELSE notes END
            WHERE id = $1
            RETURNING {FIXTURE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.opponent)
        .bind(changes.kickoff_at)
        .bind(set_location)
        .bind(location)
        .bind(set_notes)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(fixture)
    }

    async fn delete_fixture(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM fixtures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- AVAILABILITY ---

    /// upsert_availability
    ///
    /// One row per (fixture, user): updates the existing answer or inserts the first one.
    async fn upsert_availability(
        &self,
        fixture_id: Uuid,
        user_id: Uuid,
        availability: Availability,
    ) -> RepoResult<AvailabilityRecord> {
        let record = sqlx::query_as::<_, AvailabilityRecord>(
            r#"
            INSERT INTO fixture_availability (fixture_id, user_id, availability)
            VALUES ($1, $2, $3)
            ON CONFLICT (fixture_id, user_id) DO UPDATE
                SET availability = EXCLUDED.availability,
                    updated_at = NOW()
            RETURNING fixture_id, user_id, availability, updated_at
            "#,
        )
        .bind(fixture_id)
        .bind(user_id)
        .bind(availability)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_player_availability(
        &self,
        fixture_id: Uuid,
        squad_id: Uuid,
    ) -> RepoResult<Vec<PlayerAvailabilityRow>> {
        let rows = sqlx::query_as::<_, PlayerAvailabilityRow>(
            r#"
            SELECT m.user_id, u.email, m.preferred_position, fa.availability
            FROM squad_members m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN fixture_availability fa
                ON fa.fixture_id = $1 AND fa.user_id = m.user_id
            WHERE m.squad_id = $2 AND u.role = 'PLAYER'
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(fixture_id)
        .bind(squad_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- LINEUPS ---

    /// replace_lineup
    ///
    /// Runs `write_lineup` inside one transaction. Any failure rolls the whole
    /// replacement back, so the previous roster survives untouched.
    async fn replace_lineup(
        &self,
        fixture_id: Uuid,
        formation: Option<String>,
        slots: &[LineupSlot],
    ) -> RepoResult<Lineup> {
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

        match Self::write_lineup(&mut *tx, fixture_id, formation, slots).await {
            Ok(lineup) => {
                tx.commit().await?;
                Ok(lineup)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = ?rollback_err, %fixture_id, "lineup rollback failed");
                }
                tracing::warn!(error = %e, %fixture_id, "lineup replace rolled back");
                Err(e)
            }
        }
    }

    async fn get_lineup(&self, fixture_id: Uuid) -> RepoResult<Option<Lineup>> {
        let lineup = sqlx::query_as::<_, Lineup>(
            "SELECT id, fixture_id, status, formation FROM lineups WHERE fixture_id = $1",
        )
        .bind(fixture_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lineup)
    }

    async fn list_lineup_players(&self, lineup_id: Uuid) -> RepoResult<Vec<LineupPlayer>> {
        let players = sqlx::query_as::<_, LineupPlayer>(
            r#"
            SELECT lp.user_id, u.email, lp.position, lp.order_index, lp.starter
            FROM lineup_players lp
            JOIN users u ON u.id = lp.user_id
            WHERE lp.lineup_id = $1
            ORDER BY lp.order_index ASC
            "#,
        )
        .bind(lineup_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    async fn set_lineup_status(
        &self,
        fixture_id: Uuid,
        status: LineupStatus,
    ) -> RepoResult<Option<Lineup>> {
        let lineup = sqlx::query_as::<_, Lineup>(
            r#"
            UPDATE lineups SET status = $2, updated_at = NOW()
            WHERE fixture_id = $1
            RETURNING id, fixture_id, status, formation
            "#,
        )
        .bind(fixture_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lineup)
    }
}
