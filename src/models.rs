use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Text-backed enums ---

/// UnknownVariant
///
/// Returned when a stored text column holds a value outside its enum.
#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements string conversion and Postgres text encoding for a fieldless enum, so the
/// enum can be bound and decoded directly while the column stays plain VARCHAR.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(text.parse()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

/// Role
///
/// Assigned at signup and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Coach,
    Player,
}

text_enum!(Role { Coach => "COACH", Player => "PLAYER" });

/// Position
///
/// Pitch positions used for preferred positions and lineup slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Position {
    Gk,
    Rb,
    Cb,
    Lb,
    Rwb,
    Lwb,
    Cdm,
    Cm,
    Cam,
    Rw,
    Lw,
    St,
    Cf,
    Unassigned,
}

text_enum!(Position {
    Gk => "GK",
    Rb => "RB",
    Cb => "CB",
    Lb => "LB",
    Rwb => "RWB",
    Lwb => "LWB",
    Cdm => "CDM",
    Cm => "CM",
    Cam => "CAM",
    Rw => "RW",
    Lw => "LW",
    St => "ST",
    Cf => "CF",
    Unassigned => "UNASSIGNED",
});

/// Availability
///
/// A player's stated intent for a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Availability {
    Yes,
    No,
    Maybe,
}

text_enum!(Availability { Yes => "YES", No => "NO", Maybe => "MAYBE" });

/// AvailabilityAnswer
///
/// Availability as shown on a fixture: players who have not answered are listed with
/// `NO_RESPONSE` rather than omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AvailabilityAnswer {
    Yes,
    No,
    Maybe,
    NoResponse,
}

impl From<Option<Availability>> for AvailabilityAnswer {
    fn from(value: Option<Availability>) -> Self {
        match value {
            Some(Availability::Yes) => AvailabilityAnswer::Yes,
            Some(Availability::No) => AvailabilityAnswer::No,
            Some(Availability::Maybe) => AvailabilityAnswer::Maybe,
            None => AvailabilityAnswer::NoResponse,
        }
    }
}

/// LineupStatus
///
/// New lineups start as `DRAFT`; publishing is an explicit status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum LineupStatus {
    Draft,
    Published,
}

text_enum!(LineupStatus { Draft => "DRAFT", Published => "PUBLISHED" });

// --- Core Schemas (Mapped to Database) ---

/// User
///
/// Public identity fields of a row in `users`. The password hash never leaves the
/// repository except through `UserCredentials`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// UserCredentials
///
/// Internal row used by login to verify the stored password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

impl UserCredentials {
    pub fn user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Squad
///
/// A coach's team container. `coach_id` is unique across squads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Squad {
    pub id: Uuid,
    pub name: String,
    pub coach_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// SquadMember
///
/// A membership row joined with the member's email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SquadMember {
    pub id: Uuid,
    pub squad_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub preferred_position: Option<Position>,
    #[ts(type = "string")]
    pub joined_at: DateTime<Utc>,
}

/// Fixture
///
/// A scheduled match belonging to one squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Fixture {
    pub id: Uuid,
    pub squad_id: Uuid,
    pub opponent: String,
    #[ts(type = "string")]
    pub kickoff_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AvailabilityRecord
///
/// One row of `fixture_availability`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AvailabilityRecord {
    pub fixture_id: Uuid,
    pub user_id: Uuid,
    pub availability: Availability,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// PlayerAvailabilityRow
///
/// A squad player left-joined against their recorded availability for one fixture.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PlayerAvailabilityRow {
    pub user_id: Uuid,
    pub email: String,
    pub preferred_position: Option<Position>,
    pub availability: Option<Availability>,
}

/// Lineup
///
/// The single lineup row of a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lineup {
    pub id: Uuid,
    pub fixture_id: Uuid,
    pub status: LineupStatus,
    pub formation: Option<String>,
}

/// LineupPlayer
///
/// A roster slot joined with the player's email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineupPlayer {
    pub user_id: Uuid,
    pub email: String,
    pub position: Position,
    #[sqlx(rename = "order_index")]
    pub order: i16,
    pub starter: bool,
}

/// LineupSlot
///
/// A validated slot about to be written by the lineup transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct LineupSlot {
    pub user_id: Uuid,
    pub position: Position,
    pub order: i16,
    pub starter: bool,
}

/// NewFixture
///
/// Normalized insert payload produced by the fixture service.
#[derive(Debug, Clone)]
pub struct NewFixture {
    pub squad_id: Uuid,
    pub opponent: String,
    pub kickoff_at: DateTime<Utc>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// FixtureChanges
///
/// Normalized partial update. For the optional text columns the outer `Option` means
/// "supplied" and the inner one "value or cleared".
#[derive(Debug, Clone, Default)]
pub struct FixtureChanges {
    pub opponent: Option<String>,
    pub kickoff_at: Option<DateTime<Utc>>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

/// --- Request Payloads (Input Schemas) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateSquadRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub preferred_position: Option<Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateFixtureRequest {
    pub squad_id: Uuid,
    #[validate(length(min = 2, max = 100, message = "Opponent name must be between 2 and 100 characters"))]
    pub opponent: String,
    #[ts(type = "string")]
    pub kickoff_at: DateTime<Utc>,
    #[validate(length(max = 120, message = "Location must be 120 characters or less"))]
    pub location: Option<String>,
    #[validate(length(max = 1000, message = "Notes must be 1000 characters or less"))]
    pub notes: Option<String>,
}

/// UpdateFixtureRequest
///
/// Partial update payload; omitted fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateFixtureRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "Opponent name must be between 2 and 100 characters"))]
    pub opponent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub kickoff_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 120, message = "Location must be 120 characters or less"))]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "Notes must be 1000 characters or less"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SetAvailabilityRequest {
    pub availability: Availability,
    /// Target player. Ignored for players, required for coaches.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineupSlotRequest {
    pub user_id: Uuid,
    pub position: Position,
    #[validate(range(min = 1, max = 20, message = "order must be between 1 and 20"))]
    pub order: i16,
    #[serde(default)]
    pub starter: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaveLineupRequest {
    #[validate(length(max = 20, message = "formation must be 20 characters or less"))]
    pub formation: Option<String>,
    #[validate(nested)]
    pub players: Vec<LineupSlotRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateLineupStatusRequest {
    pub status: LineupStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FindUserRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

/// --- Response Schemas (Output) ---

/// SquadDetail
///
/// A squad with its members in join order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SquadDetail {
    pub id: Uuid,
    pub name: String,
    pub coach_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub members: Vec<SquadMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlayerAvailability {
    pub user_id: Uuid,
    pub email: String,
    pub preferred_position: Option<Position>,
    pub availability: AvailabilityAnswer,
}

impl From<PlayerAvailabilityRow> for PlayerAvailability {
    fn from(row: PlayerAvailabilityRow) -> Self {
        Self {
            user_id: row.user_id,
            email: row.email,
            preferred_position: row.preferred_position,
            availability: row.availability.into(),
        }
    }
}

/// FixtureDetail
///
/// A fixture plus the availability of every current squad player.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FixtureDetail {
    #[serde(flatten)]
    pub fixture: Fixture,
    pub availability: Vec<PlayerAvailability>,
}

/// LineupView
///
/// A fixture's lineup. `lineup_id`, `status` and `formation` are null and `players` is
/// empty when no lineup has been saved yet.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineupView {
    pub fixture_id: Uuid,
    pub lineup_id: Option<Uuid>,
    pub status: Option<LineupStatus>,
    pub formation: Option<String>,
    pub players: Vec<LineupPlayer>,
}

impl LineupView {
    pub fn empty(fixture_id: Uuid) -> Self {
        Self {
            fixture_id,
            lineup_id: None,
            status: None,
            formation: None,
            players: Vec::new(),
        }
    }

    pub fn from_lineup(lineup: Lineup, players: Vec<LineupPlayer>) -> Self {
        Self {
            fixture_id: lineup.fixture_id,
            lineup_id: Some(lineup.id),
            status: Some(lineup.status),
            formation: lineup.formation,
            players,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeletedResponse {
    pub ok: bool,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DatabaseHealthResponse {
    pub ok: bool,
    pub database: String,
}
