// src/services/admin_post.rs

//! Post moderation: status changes, flags, deletion and batch updates.

use std::str::FromStr;

use chrono::Utc;

use super::access::require_admin;
use super::post::load;
use crate::error::AppError;
use crate::models::{
    batch::BatchOutcome,
    category::PostCategory,
    pagination::{Direction, PageParams, PageResponse},
    post::{
        CategoryStat, PostFlag, PostQuery, PostSort, PostStatus, PostSummary, PostView,
        StatusView, published_after_transition,
    },
    user::Actor,
};
use crate::store::Store;

const DEFAULT_DELETE_REASON: &str = "Post deleted by administrator";

/// Optional listing filters, already parsed.
#[derive(Debug, Default, Clone)]
pub struct AdminPostFilter {
    pub status: Option<PostStatus>,
    pub category: Option<PostCategory>,
    pub keyword: Option<String>,
}

impl AdminPostFilter {
    pub fn parse(
        status: Option<&str>,
        category: Option<&str>,
        keyword: Option<&str>,
    ) -> Result<Self, AppError> {
        fn present(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        Ok(AdminPostFilter {
            status: present(status).map(PostStatus::from_code).transpose()?,
            category: present(category).map(PostCategory::parse_input).transpose()?,
            keyword: present(keyword).map(str::to_string),
        })
    }
}

/// Named moderation shortcuts accepted by the action endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Approve,
    Reject,
    SetTop,
    RemoveTop,
    SetRecommended,
    RemoveRecommended,
    Delete,
}

impl FromStr for PostAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(PostAction::Approve),
            "reject" => Ok(PostAction::Reject),
            "set_top" => Ok(PostAction::SetTop),
            "remove_top" => Ok(PostAction::RemoveTop),
            "set_recommended" => Ok(PostAction::SetRecommended),
            "remove_recommended" => Ok(PostAction::RemoveRecommended),
            "delete" => Ok(PostAction::Delete),
            other => Err(AppError::invalid_field(
                "action",
                format!("Unknown action: {}", other),
            )),
        }
    }
}

pub async fn list(
    store: &dyn Store,
    actor: &Actor,
    filter: AdminPostFilter,
    params: PageParams,
) -> Result<PageResponse<PostSummary>, AppError> {
    require_admin(actor)?;
    let page = params.into_request(Direction::Desc);
    let sort = PostSort::resolve(&page, &PostSort::ADMIN, PostSort::CreatedAt)?;
    let query = PostQuery {
        status: filter.status,
        category: filter.category,
        author_id: None,
        keyword: filter.keyword,
    };
    let rows = store.list_posts(&query, sort, &page).await?;
    Ok(PageResponse::from_rows(rows, &page, PostSummary::from))
}

/// Drafts awaiting review, oldest first.
pub async fn review_queue(
    store: &dyn Store,
    actor: &Actor,
    params: PageParams,
) -> Result<PageResponse<PostSummary>, AppError> {
    require_admin(actor)?;
    let page = params.into_request(Direction::Asc);
    let query = PostQuery {
        status: Some(PostStatus::Draft),
        ..Default::default()
    };
    let rows = store.list_posts(&query, PostSort::CreatedAt, &page).await?;
    Ok(PageResponse::from_rows(rows, &page, PostSummary::from))
}

pub async fn get(store: &dyn Store, actor: &Actor, id: i64) -> Result<PostView, AppError> {
    require_admin(actor)?;
    Ok(PostView::render(load(store, id).await?, None))
}

async fn apply_status(store: &dyn Store, id: i64, status: PostStatus) -> Result<PostView, AppError> {
    let mut post = load(store, id).await?;
    let now = Utc::now();
    post.published_at = published_after_transition(post.status, status, post.published_at, now);
    post.status = status;
    post.updated_at = now;
    store.save_post(&post).await?;
    Ok(PostView::render(post, None))
}

pub async fn set_status(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    status: PostStatus,
) -> Result<PostView, AppError> {
    require_admin(actor)?;
    let view = apply_status(store, id, status).await?;
    tracing::info!("Admin {} set post {} status to {}", actor.username, id, status.code());
    Ok(view)
}

async fn apply_flag(
    store: &dyn Store,
    id: i64,
    flag: PostFlag,
    value: bool,
) -> Result<PostView, AppError> {
    let mut post = load(store, id).await?;
    match flag {
        PostFlag::Top => post.is_top = value,
        PostFlag::Recommended => post.is_recommended = value,
    }
    post.updated_at = Utc::now();
    store.save_post(&post).await?;
    Ok(PostView::render(post, None))
}

pub async fn set_flag(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    flag: PostFlag,
    value: bool,
) -> Result<PostView, AppError> {
    require_admin(actor)?;
    let view = apply_flag(store, id, flag, value).await?;
    tracing::info!("Admin {} set {:?} = {} on post {}", actor.username, flag, value, id);
    Ok(view)
}

/// Soft-deletes the post's live comments, then removes the post.
pub async fn delete(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    reason: Option<&str>,
) -> Result<(), AppError> {
    require_admin(actor)?;
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_DELETE_REASON);
    let cascaded = store
        .delete_post_cascade(id, actor.id, reason, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Post", id))?;
    tracing::info!(
        "Admin {} deleted post {} ({} comments cascaded, reason: {})",
        actor.username,
        id,
        cascaded,
        reason
    );
    Ok(())
}

/// Dispatches a named action. Returns the updated post, or None after a delete.
pub async fn perform_action(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    action: PostAction,
    reason: Option<&str>,
) -> Result<Option<PostView>, AppError> {
    require_admin(actor)?;
    tracing::info!(
        "Admin {} performing {:?} on post {} (reason: {})",
        actor.username,
        action,
        id,
        reason.unwrap_or("-")
    );
    let view = match action {
        PostAction::Approve => set_status(store, actor, id, PostStatus::Published).await?,
        PostAction::Reject => set_status(store, actor, id, PostStatus::Hidden).await?,
        PostAction::SetTop => set_flag(store, actor, id, PostFlag::Top, true).await?,
        PostAction::RemoveTop => set_flag(store, actor, id, PostFlag::Top, false).await?,
        PostAction::SetRecommended => {
            set_flag(store, actor, id, PostFlag::Recommended, true).await?
        }
        PostAction::RemoveRecommended => {
            set_flag(store, actor, id, PostFlag::Recommended, false).await?
        }
        PostAction::Delete => {
            delete(store, actor, id, reason).await?;
            return Ok(None);
        }
    };
    Ok(Some(view))
}

/// Best-effort: each id is its own unit, a missing id fails only itself.
pub async fn batch_status(
    store: &dyn Store,
    actor: &Actor,
    ids: &[i64],
    status: PostStatus,
) -> Result<BatchOutcome, AppError> {
    require_admin(actor)?;
    let mut outcome = BatchOutcome::default();
    for &id in ids {
        match apply_status(store, id, status).await {
            Ok(_) => outcome.applied(id),
            Err(e) => outcome.failed(id, "status update", &e),
        }
    }
    tracing::info!(
        "Admin {} set status {} on {}/{} posts",
        actor.username,
        status.code(),
        outcome.succeeded,
        outcome.requested
    );
    Ok(outcome)
}

/// Counts across every status.
pub async fn category_stats(store: &dyn Store, actor: &Actor) -> Result<Vec<CategoryStat>, AppError> {
    require_admin(actor)?;
    super::post::category_stats(store, None).await
}

pub fn statuses() -> Vec<StatusView> {
    PostStatus::ALL.into_iter().map(StatusView::from).collect()
}
