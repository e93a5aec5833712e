use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::{
    AppState,
    auth::{removal_cookie, resolve_identity, session_cookie},
    error::{AppError, ErrorBody},
    extract::ApiJson,
    models::{LoginRequest, OkResponse, SignupRequest, User},
    services::{accounts, normalize_email},
};

/// signup
///
/// [Public Route] Creates a COACH or PLAYER account. Rate limited per client.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid input or email already registered", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let payload = SignupRequest {
        email: normalize_email(&payload.email),
        ..payload
    };
    payload.validate()?;
    let user =
        accounts::signup(&*state.repo, &payload.email, &payload.password, payload.role).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Verifies credentials and sets the session cookie.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = OkResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<OkResponse>), AppError> {
    let payload = LoginRequest {
        email: normalize_email(&payload.email),
        ..payload
    };
    payload.validate()?;
    let (_, token) = accounts::login(
        &*state.repo,
        &state.config.jwt_secret,
        &payload.email,
        &payload.password,
    )
    .await?;

    let jar = jar.add(session_cookie(&state.config, token));
    Ok((jar, Json(OkResponse { ok: true })))
}

/// logout
///
/// [Public Route] Expires the session cookie. Always succeeds.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Session cookie cleared"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.add(removal_cookie(&state.config)), StatusCode::NO_CONTENT)
}

/// current_user
///
/// [Public Route] Reports the identity behind the request's session, if any.
#[utoipa::path(
    get,
    path = "/auth/current-user",
    responses(
        (status = 200, description = "Current identity", body = User),
        (status = 401, description = "Not Authenticated", body = ErrorBody)
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, AppError> {
    let identity = resolve_identity(&headers, &state.config)
        .ok_or_else(|| AppError::Unauthorized("Not Authenticated".to_string()))?;

    Ok(Json(User {
        id: identity.id,
        email: identity.email,
        role: identity.role,
    }))
}
