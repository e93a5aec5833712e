use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_middleware`, so handlers always receive a valid
/// identity. Coach-only routes additionally declare `CoachUser`; ownership and membership
/// are checked by the services through the squad policy.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me/squad
        // Coach: the owned squad. Player: the squad of the earliest membership.
        .route("/me/squad", get(handlers::squads::get_my_squad))
        // --- Squads ---
        .route("/squads", post(handlers::squads::create_squad))
        .route(
            "/squads/{id}",
            get(handlers::squads::get_squad).delete(handlers::squads::delete_squad),
        )
        .route("/squads/{id}/members", post(handlers::squads::add_member))
        .route(
            "/squads/{id}/fixtures",
            get(handlers::fixtures::list_squad_fixtures),
        )
        // --- Fixtures & availability ---
        .route("/fixtures", post(handlers::fixtures::create_fixture))
        .route(
            "/fixtures/{id}",
            get(handlers::fixtures::get_fixture)
                .patch(handlers::fixtures::update_fixture)
                .delete(handlers::fixtures::delete_fixture),
        )
        .route(
            "/fixtures/{id}/availability",
            post(handlers::fixtures::set_availability),
        )
        // --- Lineups ---
        // POST replaces the whole roster atomically.
        .route(
            "/fixtures/{id}/lineup",
            get(handlers::lineups::get_lineup).post(handlers::lineups::save_lineup),
        )
        .route(
            "/fixtures/{id}/lineup/status",
            patch(handlers::lineups::update_lineup_status),
        )
        // --- Users ---
        .route("/users:lookup", post(handlers::users::lookup_user))
}
