// src/handlers/admin/users.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        pagination::PageParams,
        user::{BatchEnabledRequest, SetEnabledRequest, UserFilterParams},
    },
    services::admin_user,
    store::Store,
    utils::jwt::AdminActor,
};

/// Lists users. `?enabled=` and `?role=` filter; sort by created_at, username or id.
pub async fn list_users(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Query(filter): Query<UserFilterParams>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_user::list(store.as_ref(), &actor, filter, params).await?))
}

pub async fn get_user(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_user::get(store.as_ref(), &actor, id).await?))
}

/// Enables or disables an account. The acting admin's own id is refused.
pub async fn set_enabled(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
    Json(payload): Json<SetEnabledRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = admin_user::set_enabled(store.as_ref(), &actor, id, payload.enabled).await?;
    Ok(Json(view))
}

pub async fn batch_set_enabled(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Json(payload): Json<BatchEnabledRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome =
        admin_user::batch_set_enabled(store.as_ref(), &actor, &payload.user_ids, payload.enabled)
            .await?;
    Ok(Json(outcome))
}

/// Hard delete.
pub async fn delete_user(
    State(store): State<Arc<dyn Store>>,
    AdminActor(actor): AdminActor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    admin_user::delete(store.as_ref(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
