// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{role::UserRole, user::Actor},
    state::AppState,
};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// Role code at signing time. Authorization uses the reloaded user row.
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Signs a new HS256 token for the user.
pub fn sign_jwt(
    id: i64,
    role: UserRole,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs()
        + expiration_seconds;

    let claims = Claims {
        sub: id.to_string(),
        role: role.code().to_owned(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum Middleware: Identification.
///
/// Resolves `Authorization: Bearer <token>` to an [`Actor`] by reloading the
/// user, so disabled or locked accounts stop authenticating immediately.
/// Requests without a usable token continue anonymously; the extractors below
/// decide whether that is acceptable.
pub async fn identify_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match resolve_actor(&state, token).await {
            Ok(Some(actor)) => {
                req.extensions_mut().insert(actor);
            }
            Ok(None) => {}
            Err(AppError::AuthError(reason)) => {
                tracing::debug!("Ignoring bearer token: {}", reason);
            }
            Err(e) => return e.into_response(),
        }
    }
    next.run(req).await
}

async fn resolve_actor(state: &AppState, token: &str) -> Result<Option<Actor>, AppError> {
    let claims = verify_jwt(token, &state.config.jwt_secret)?;
    let user = state.store.find_user(claims.user_id()?).await?;
    Ok(user
        .filter(|u| u.can_authenticate())
        .map(|u| Actor::from(&u)))
}

/// Axum Middleware: Admin Authorization.
///
/// Must be layered inside `identify_middleware`. 401 without an actor,
/// 403 unless the actor is an ADMIN.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;

    if !actor.is_admin() {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }

    Ok(next.run(req).await)
}

/// The authenticated caller. Rejects with 401 when absent.
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
    }
}

/// The caller if authenticated, for public reads that compute per-viewer flags.
#[derive(Debug, Clone)]
pub struct MaybeActor(pub Option<Actor>);

impl<S> FromRequestParts<S> for MaybeActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(parts.extensions.get::<Actor>().cloned()))
    }
}

/// An authenticated ADMIN. 401 when anonymous, 403 for other roles.
#[derive(Debug, Clone)]
pub struct AdminActor(pub Actor);

impl<S> FromRequestParts<S> for AdminActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_request_parts(parts, state).await?;
        if !actor.is_admin() {
            return Err(AppError::Forbidden("Administrator role required".to_string()));
        }
        Ok(AdminActor(actor))
    }
}
