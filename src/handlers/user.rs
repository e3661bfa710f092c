// src/handlers/user.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        pagination::PageParams,
        user::{Actor, ChangePasswordRequest, DeleteAccountRequest, UpdateProfileRequest},
    },
    services::{comment, user},
    store::Store,
    utils::jwt::MaybeActor,
};

pub async fn get_me(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(user::profile(store.as_ref(), &actor).await?))
}

/// Updates email, avatar and bio. Omitted fields are left unchanged.
pub async fn update_me(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(user::update_profile(store.as_ref(), &actor, payload).await?))
}

pub async fn change_password(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    user::change_password(store.as_ref(), &actor, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Disables the caller's account after confirming the password.
pub async fn delete_me(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    user::delete_account(store.as_ref(), &actor, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sentiment label counts for a user's analyzed posts and comments.
pub async fn emotion_stats(
    State(store): State<Arc<dyn Store>>,
    _actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(user::emotion_stats(store.as_ref(), id).await?))
}

/// A user's visible comments. Public.
pub async fn list_comments(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = comment::by_user(store.as_ref(), viewer.as_ref(), id, params).await?;
    Ok(Json(page))
}
