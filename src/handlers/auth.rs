// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{Actor, LoginRequest, RegisterRequest},
    services::user,
    store::Store,
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(store): State<Arc<dyn Store>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = user::register(store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Disabled or locked accounts are refused even with the right password.
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let auth = user::login(store.as_ref(), &config, payload).await?;
    Ok(Json(auth))
}

/// The account behind the presented token.
pub async fn whoami(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(user::profile(store.as_ref(), &actor).await?))
}
