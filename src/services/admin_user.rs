// src/services/admin_user.rs

use chrono::Utc;

use super::access::{require_admin, require_not_self};
use crate::error::AppError;
use crate::models::{
    batch::BatchOutcome,
    pagination::{Direction, PageParams, PageResponse},
    role::UserRole,
    user::{Actor, UserFilterParams, UserQuery, UserView},
};
use crate::store::{Store, USER_SORTS};

const SELF_STATUS_MESSAGE: &str = "You cannot change the status of your own account";
const SELF_DELETE_MESSAGE: &str = "You cannot delete your own account";

impl TryFrom<UserFilterParams> for UserQuery {
    type Error = AppError;

    fn try_from(params: UserFilterParams) -> Result<Self, Self::Error> {
        let role = params
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(UserRole::from_code)
            .transpose()?;
        Ok(UserQuery {
            enabled: params.enabled,
            role,
        })
    }
}

pub async fn list(
    store: &dyn Store,
    actor: &Actor,
    filter: UserFilterParams,
    params: PageParams,
) -> Result<PageResponse<UserView>, AppError> {
    require_admin(actor)?;
    let query = UserQuery::try_from(filter)?;
    let page = params.into_request(Direction::Desc);
    let sort = page.sort_column(&USER_SORTS, "created_at")?;
    let rows = store.list_users(&query, sort, &page).await?;
    Ok(PageResponse::from_rows(rows, &page, UserView::from))
}

pub async fn get(store: &dyn Store, actor: &Actor, id: i64) -> Result<UserView, AppError> {
    require_admin(actor)?;
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(UserView::from(user))
}

async fn apply_enabled(store: &dyn Store, actor: &Actor, id: i64, enabled: bool) -> Result<(), AppError> {
    require_not_self(actor, id, SELF_STATUS_MESSAGE)?;
    if !store.set_user_enabled(id, enabled, Utc::now()).await? {
        return Err(AppError::not_found("User", id));
    }
    Ok(())
}

pub async fn set_enabled(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    enabled: bool,
) -> Result<UserView, AppError> {
    require_admin(actor)?;
    apply_enabled(store, actor, id, enabled).await?;
    tracing::info!("Admin {} set user {} enabled={}", actor.username, id, enabled);
    get(store, actor, id).await
}

/// Hard delete. The user's posts and comments stay behind.
pub async fn delete(store: &dyn Store, actor: &Actor, id: i64) -> Result<(), AppError> {
    require_admin(actor)?;
    require_not_self(actor, id, SELF_DELETE_MESSAGE)?;
    if !store.delete_user(id).await? {
        return Err(AppError::not_found("User", id));
    }
    tracing::info!("Admin {} deleted user {}", actor.username, id);
    Ok(())
}

/// Self-targeting and missing ids fail individually; the rest still apply.
pub async fn batch_set_enabled(
    store: &dyn Store,
    actor: &Actor,
    ids: &[i64],
    enabled: bool,
) -> Result<BatchOutcome, AppError> {
    require_admin(actor)?;
    let mut outcome = BatchOutcome::default();
    for &id in ids {
        match apply_enabled(store, actor, id, enabled).await {
            Ok(()) => outcome.applied(id),
            Err(e) => outcome.failed(id, "user status update", &e),
        }
    }
    tracing::info!(
        "Admin {} set enabled={} on {}/{} users",
        actor.username,
        enabled,
        outcome.succeeded,
        outcome.requested
    );
    Ok(outcome)
}
