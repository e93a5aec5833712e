use crate::{
    AppState, handlers,
    rate_limit::{RateLimiter, rate_limit_middleware},
};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session. Signup and login are wrapped in the per-client rate
/// limiter; logout and current-user are not, since they never check a password.
pub fn public_routes(limiter: RateLimiter) -> Router<AppState> {
    let credential_routes = Router::new()
        // POST /auth/signup
        .route("/auth/signup", post(handlers::auth::signup))
        // POST /auth/login
        // Sets the http-only session cookie on success.
        .route("/auth/login", post(handlers::auth::login))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health::health))
        // GET /health/db
        // Readiness probe; 503 while the database is unreachable.
        .route("/health/db", get(handlers::health::database_health))
        .merge(credential_routes)
        .route("/auth/logout", post(handlers::auth::logout))
        // GET /auth/current-user
        // Answers 401 "Not Authenticated" itself rather than relying on the auth layer.
        .route("/auth/current-user", get(handlers::auth::current_user))
}
