// src/handlers/comment.rs

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
        comment::{CreateCommentRequest, UpdateCommentRequest},
        pagination::PageParams,
        user::Actor,
    },
    services::comment,
    store::Store,
    utils::jwt::MaybeActor,
};

/// Comments on a published post, or replies to a comment on it.
pub async fn create_comment(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let view = comment::create(store.as_ref(), &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_comment(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(
        comment::update(store.as_ref(), &actor, id, &payload.content).await?,
    ))
}

pub async fn delete_comment(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    comment::delete(store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_comment(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(comment::get(store.as_ref(), viewer.as_ref(), id).await?))
}

pub async fn list_replies(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = comment::replies(store.as_ref(), viewer.as_ref(), id, params).await?;
    Ok(Json(page))
}

/// Top-level comments with their first replies inlined.
pub async fn list_for_post(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(post_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = comment::threaded(store.as_ref(), viewer.as_ref(), post_id, params).await?;
    Ok(Json(page))
}

pub async fn list_top_level(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(post_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = comment::top_level(store.as_ref(), viewer.as_ref(), post_id, params).await?;
    Ok(Json(page))
}

pub async fn list_my_comments(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(comment::mine(store.as_ref(), &actor, params).await?))
}
