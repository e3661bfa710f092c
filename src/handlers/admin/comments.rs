// src/handlers/admin/comments.rs

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
        comment::{BatchCommentRequest, CommentFilterParams, ModerationReason, SetActiveRequest},
        pagination::PageParams,
    },
    services::admin_comment,
    store::Store,
    utils::jwt::AdminActor,
};

/// All comments with raw content. `?isDeleted=` narrows by deletion state.
pub async fn list_comments(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Query(filter): Query<CommentFilterParams>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = admin_comment::list(store.as_ref(), &actor, filter.is_deleted, params).await?;
    Ok(Json(page))
}

pub async fn list_by_deleted(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(is_deleted): Path<bool>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = admin_comment::list(store.as_ref(), &actor, Some(is_deleted), params).await?;
    Ok(Json(page))
}

pub async fn list_by_user(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = admin_comment::by_user(store.as_ref(), &actor, user_id, params).await?;
    Ok(Json(page))
}

pub async fn list_by_post(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(post_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = admin_comment::by_post(store.as_ref(), &actor, post_id, params).await?;
    Ok(Json(page))
}

pub async fn get_comment(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_comment::get(store.as_ref(), &actor, id).await?))
}

/// Moderation soft delete. The post's comment count is not touched.
pub async fn soft_delete(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Query(reason): Query<ModerationReason>,
) -> Result<impl IntoResponse, AppError> {
    reason.validate()?;
    let view = admin_comment::soft_delete(store.as_ref(), &actor, id, reason.reason.as_deref()).await?;
    Ok(Json(view))
}

pub async fn set_active(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let view = admin_comment::set_active(
        store.as_ref(),
        &actor,
        id,
        payload.active,
        payload.reason.as_deref(),
    )
    .await?;
    Ok(Json(view))
}

pub async fn hard_delete(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    admin_comment::hard_delete(store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_soft_delete(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Query(reason): Query<ModerationReason>,
    Json(payload): Json<BatchCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    reason.validate()?;
    let outcome = admin_comment::batch_soft_delete(
        store.as_ref(),
        &actor,
        &payload.comment_ids,
        reason.reason.as_deref(),
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn batch_hard_delete(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Json(payload): Json<BatchCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = admin_comment::batch_hard_delete(store.as_ref(), &actor, &payload.comment_ids).await?;
    Ok(Json(outcome))
}
