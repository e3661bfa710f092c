// src/handlers/post.rs

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
        post::{CreatePostRequest, LimitParams, PostFlag, PostStatus, SearchParams, UpdatePostRequest},
        user::Actor,
    },
    services::post,
    store::Store,
    utils::jwt::MaybeActor,
};

/// Creates a post owned by the caller. Returns 201 Created.
pub async fn create_post(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let view = post::create(store.as_ref(), &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_post(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    Ok(Json(post::update(store.as_ref(), &actor, id, payload).await?))
}

pub async fn publish_post(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::publish(store.as_ref(), &actor, id).await?))
}

/// Owner delete. The post's comments are soft-deleted with it.
pub async fn delete_post(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    post::delete(store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_post(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::get_by_id(store.as_ref(), viewer.as_ref(), id).await?))
}

/// Reading by slug counts a view on published posts.
pub async fn get_post_by_slug(
    State(store): State<Arc<dyn Store>>,
    MaybeActor(viewer): MaybeActor,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::get_by_slug(store.as_ref(), viewer.as_ref(), &slug).await?))
}

pub async fn list_my_posts(
    State(store): State<Arc<dyn Store>>,
    actor: Actor,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::mine(store.as_ref(), &actor, params).await?))
}

/// Published posts. Sort columns: published_at, created_at, updated_at,
/// view_count, comment_count.
pub async fn feed(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::feed(store.as_ref(), params).await?))
}

pub async fn list_by_category(
    State(store): State<Arc<dyn Store>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::by_category(store.as_ref(), &category, params).await?))
}

pub async fn search(
    State(store): State<Arc<dyn Store>>,
    Query(search): Query<SearchParams>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = post::search(store.as_ref(), search.keyword.as_deref(), params).await?;
    Ok(Json(page))
}

pub async fn list_top(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(post::flagged(store.as_ref(), PostFlag::Top, params.limit).await?))
}

pub async fn list_recommended(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        post::flagged(store.as_ref(), PostFlag::Recommended, params.limit).await?,
    ))
}

pub async fn list_categories() -> impl IntoResponse {
    Json(post::categories())
}

/// Published post counts per category.
pub async fn category_stats(
    State(store): State<Arc<dyn Store>>,
) -> Result<impl IntoResponse, AppError> {
    let stats = post::category_stats(store.as_ref(), Some(PostStatus::Published)).await?;
    Ok(Json(stats))
}
