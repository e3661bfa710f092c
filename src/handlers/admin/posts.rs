// src/handlers/admin/posts.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::ModerationReason,
        pagination::PageParams,
        post::{PostFlag, PostStatus},
    },
    services::{
        admin_post::{self, AdminPostFilter, PostAction},
        post,
    },
    store::Store,
    utils::jwt::AdminActor,
};

/// Listing filters (`?status=&category=&keyword=`).
#[derive(Debug, Default, Deserialize)]
pub struct AdminPostParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub value: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActionRequest {
    pub action: String,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusRequest {
    pub post_ids: Vec<i64>,
    pub status: String,
}

/// Sort columns: created_at, updated_at, view_count, comment_count.
pub async fn list_posts(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Query(filter): Query<AdminPostParams>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = AdminPostFilter::parse(
        filter.status.as_deref(),
        filter.category.as_deref(),
        filter.keyword.as_deref(),
    )?;
    Ok(Json(admin_post::list(store.as_ref(), &actor, filter, params).await?))
}

/// Drafts waiting for review, oldest first.
pub async fn review_queue(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_post::review_queue(store.as_ref(), &actor, params).await?))
}

pub async fn get_post(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_post::get(store.as_ref(), &actor, id).await?))
}

pub async fn set_status(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = PostStatus::from_code(&payload.status)?;
    Ok(Json(admin_post::set_status(store.as_ref(), &actor, id, status).await?))
}

pub async fn set_top(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Json(payload): Json<FlagRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = admin_post::set_flag(store.as_ref(), &actor, id, PostFlag::Top, payload.value).await?;
    Ok(Json(view))
}

pub async fn set_recommended(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Json(payload): Json<FlagRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view =
        admin_post::set_flag(store.as_ref(), &actor, id, PostFlag::Recommended, payload.value)
            .await?;
    Ok(Json(view))
}

/// `?reason=` is optional and recorded on the cascaded comments.
pub async fn delete_post(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Query(reason): Query<ModerationReason>,
) -> Result<impl IntoResponse, AppError> {
    reason.validate()?;
    admin_post::delete(store.as_ref(), &actor, id, reason.reason.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// approve | reject | set_top | remove_top | set_recommended | remove_recommended | delete
pub async fn perform_action(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Json(payload): Json<ActionRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;
    let action: PostAction = payload.action.parse()?;
    let result =
        admin_post::perform_action(store.as_ref(), &actor, id, action, payload.reason.as_deref())
            .await?;
    Ok(match result {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

pub async fn batch_status(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Json(payload): Json<BatchStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = PostStatus::from_code(&payload.status)?;
    let outcome = admin_post::batch_status(store.as_ref(), &actor, &payload.post_ids, status).await?;
    Ok(Json(outcome))
}

/// Counts over every status.
pub async fn category_stats(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_post::category_stats(store.as_ref(), &actor).await?))
}

pub async fn list_categories(_admin: AdminActor) -> impl IntoResponse {
    Json(post::categories())
}

pub async fn list_statuses(_admin: AdminActor) -> impl IntoResponse {
    Json(admin_post::statuses())
}
