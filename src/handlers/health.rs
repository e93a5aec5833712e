use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    models::{DatabaseHealthResponse, HealthResponse},
};

/// health
///
/// Liveness: answers as long as the process is serving requests.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: env!("CARGO_PKG_NAME").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// database_health
///
/// Readiness: round-trips to the store, 503 when it cannot be reached.
#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, description = "Database reachable", body = DatabaseHealthResponse),
        (status = 503, description = "Database unreachable", body = DatabaseHealthResponse)
    )
)]
pub async fn database_health(
    State(state): State<AppState>,
) -> (StatusCode, Json<DatabaseHealthResponse>) {
    match state.repo.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(DatabaseHealthResponse {
                ok: true,
                database: "up".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(DatabaseHealthResponse {
                    ok: false,
                    database: "down".to_string(),
                }),
            )
        }
    }
}
