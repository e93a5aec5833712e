use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod policy;
pub mod rate_limit;
pub mod repository;
pub mod services;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use error::AppError;
use rate_limit::RateLimiter;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health, handlers::health::database_health,
        handlers::auth::signup, handlers::auth::login, handlers::auth::logout,
        handlers::auth::current_user,
        handlers::squads::create_squad, handlers::squads::get_squad,
        handlers::squads::delete_squad, handlers::squads::add_member,
        handlers::squads::get_my_squad,
        handlers::fixtures::create_fixture, handlers::fixtures::get_fixture,
        handlers::fixtures::update_fixture, handlers::fixtures::delete_fixture,
        handlers::fixtures::list_squad_fixtures, handlers::fixtures::set_availability,
        handlers::lineups::save_lineup, handlers::lineups::get_lineup,
        handlers::lineups::update_lineup_status,
        handlers::users::lookup_user
    ),
    components(
        schemas(
            error::ErrorBody,
            models::Role, models::Position, models::Availability, models::AvailabilityAnswer,
            models::LineupStatus, models::User, models::Squad, models::SquadMember,
            models::SquadDetail, models::Fixture, models::FixtureDetail,
            models::PlayerAvailability, models::AvailabilityRecord, models::LineupPlayer,
            models::LineupView, models::SignupRequest, models::LoginRequest,
            models::CreateSquadRequest, models::AddMemberRequest, models::CreateFixtureRequest,
            models::UpdateFixtureRequest, models::SetAvailabilityRequest,
            models::LineupSlotRequest, models::SaveLineupRequest,
            models::UpdateLineupStatusRequest, models::FindUserRequest,
            models::DeletedResponse, models::OkResponse, models::HealthResponse,
            models::DatabaseHealthResponse,
        )
    ),
    tags(
        (name = "squad-manager", description = "Squads, fixtures, availability and lineups")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared container handed to every handler. The repository owns the
/// connection pool; nothing else holds database state.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Buckets for the signup and login rate limit.
    pub auth_limiter: RateLimiter,
    /// Process start, reported by the liveness probe.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let auth_limiter = RateLimiter::new(
            config.auth_rate_limit,
            Duration::from_secs(config.auth_rate_window_secs),
        )
        .trust_forwarded(config.trust_proxy);
        Self {
            repo,
            config,
            auth_limiter,
            started_at: Instant::now(),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(app_state: &AppState) -> RateLimiter {
        app_state.auth_limiter.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` rejects with 401 before the
/// handler runs when the request carries no valid session.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Unknown paths answer in the same `{ "error": ... }` shape as every other failure.
async fn not_found() -> AppError {
    AppError::not_found("Not Found")
}

/// Credentialed CORS: the session cookie only crosses origins that are listed explicitly.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// create_router
///
/// Assembles the routers, applies the scoped and global middleware, and registers the
/// application state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes(state.auth_limiter.clone()))
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .fallback(not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of a request carries its
/// `x-request-id` alongside method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
