use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, SESSION_TTL_SECS},
    error::AppError,
    models::{Role, User},
};

/// Claims
///
/// The payload signed into every session token. Identity is taken from the claims
/// alone; no database lookup happens while resolving a request's caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
}

/// issue_token
///
/// Signs a token for `user` valid for seven days.
pub fn issue_token(user: &User, secret: &str) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {e}")))
}

/// decode_token
///
/// Verifies signature and expiry. Any failure (bad signature, malformed, expired)
/// yields `None`.
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!(error = %e, "rejected session token");
            None
        }
    }
}

/// AuthUser
///
/// The request-scoped identity of an authenticated caller. Handlers receive it by value
/// through the extractor below; nothing is attached to or mutated on the request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_coach(&self) -> bool {
        self.role == Role::Coach
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// resolve_identity
///
/// Looks for a token in the session cookie first, then in `Authorization: Bearer`.
/// Never fails: an absent or invalid token simply means "unauthenticated".
pub fn resolve_identity(headers: &HeaderMap, config: &AppConfig) -> Option<AuthUser> {
    let from_cookie = CookieJar::from_headers(headers)
        .get(&config.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    let token = from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.trim().to_string())
    })?;

    decode_token(&token, &config.jwt_secret).map(AuthUser::from)
}

/// AuthUser Extractor Implementation
///
/// Rejects with 401 when no valid identity can be resolved.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        resolve_identity(&parts.headers, &config).ok_or_else(AppError::unauthorized)
    }
}

/// CoachUser
///
/// An `AuthUser` whose role is COACH. Declaring it in a handler signature is the
/// route's role requirement: 401 without identity, 403 for any other role.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachUser(pub AuthUser);

impl<S> FromRequestParts<S> for CoachUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_coach() {
            return Err(AppError::Forbidden("Forbidden: Coach only".to_string()));
        }
        Ok(CoachUser(user))
    }
}

// --- Session cookie ---

fn base_cookie(config: &AppConfig, value: String) -> Cookie<'static> {
    let same_site = if config.is_production() {
        SameSite::None
    } else {
        SameSite::Lax
    };

    let mut cookie = Cookie::build((config.cookie_name.clone(), value))
        .http_only(true)
        .secure(config.is_production())
        .same_site(same_site)
        .path("/");
    if let Some(domain) = &config.cookie_domain {
        cookie = cookie.domain(domain.clone());
    }
    cookie.build()
}

/// The cookie set on successful login.
pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    let mut cookie = base_cookie(config, token);
    cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS));
    cookie
}

/// An expired cookie with the session cookie's name, path and domain. Adding it to the
/// response clears the session whether or not the request carried one.
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = base_cookie(config, String::new());
    cookie.make_removal();
    cookie
}
