// src/services/comment.rs

use chrono::Utc;

use super::access::require_owner;
use crate::error::AppError;
use crate::models::{
    comment::{
        Comment, CommentQuery, CommentView, CounterPolicy, CreateCommentRequest, NewComment,
        ParentFilter, REPLY_PREVIEW_COUNT,
    },
    pagination::{Direction, PageParams, PageRequest, PageResponse},
    post::PostStatus,
    user::Actor,
};
use crate::store::Store;
use crate::utils::html::clean_html;

pub(crate) async fn load(store: &dyn Store, id: i64) -> Result<Comment, AppError> {
    store
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment", id))
}

fn sanitized(raw: &str) -> Result<String, AppError> {
    let content = clean_html(raw);
    if content.is_empty() {
        return Err(AppError::invalid_field("content", "Content must not be empty"));
    }
    Ok(content)
}

/// Comments only on PUBLISHED posts; a reply's parent must be live and on
/// the same post. Bumps the post's comment_count in the same unit.
pub async fn create(
    store: &dyn Store,
    actor: &Actor,
    req: CreateCommentRequest,
) -> Result<CommentView, AppError> {
    let post = super::post::load(store, req.post_id).await?;
    if post.status != PostStatus::Published {
        return Err(AppError::Conflict("Cannot comment on unpublished post".to_string()));
    }

    if let Some(parent_id) = req.parent_comment_id {
        let parent = store
            .find_comment(parent_id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| AppError::not_found("Comment", parent_id))?;
        if parent.post_id != post.id {
            return Err(AppError::invalid_field(
                "parentCommentId",
                "Parent comment belongs to a different post",
            ));
        }
    }

    let id = store
        .insert_comment(NewComment {
            content: sanitized(&req.content)?,
            user_id: actor.id,
            post_id: post.id,
            parent_comment_id: req.parent_comment_id,
            created_at: Utc::now(),
        })
        .await?;

    Ok(CommentView::render(load(store, id).await?, Some(actor)))
}

pub async fn update(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    content: &str,
) -> Result<CommentView, AppError> {
    let comment = load(store, id).await?;
    require_owner(actor, comment.user_id, "You can only edit your own comments")?;
    if comment.is_deleted {
        return Err(AppError::Conflict("Cannot edit deleted comment".to_string()));
    }

    store
        .update_comment_content(id, &sanitized(content)?, Utc::now())
        .await?;
    Ok(CommentView::render(load(store, id).await?, Some(actor)))
}

/// Self-service soft delete. Decrements the post's comment_count.
pub async fn delete(store: &dyn Store, actor: &Actor, id: i64) -> Result<(), AppError> {
    let comment = load(store, id).await?;
    require_owner(actor, comment.user_id, "You can only delete your own comments")?;
    if comment.is_deleted {
        return Err(AppError::Conflict("Comment already deleted".to_string()));
    }

    let deleted = store
        .soft_delete_comment(id, actor.id, None, CounterPolicy::Decrement, Utc::now())
        .await?;
    if !deleted {
        // lost a race with another delete
        return Err(AppError::Conflict("Comment already deleted".to_string()));
    }
    Ok(())
}

/// Any comment by id, deleted or hidden ones rendered with a placeholder.
pub async fn get(store: &dyn Store, viewer: Option<&Actor>, id: i64) -> Result<CommentView, AppError> {
    Ok(CommentView::render(load(store, id).await?, viewer))
}

async fn list(
    store: &dyn Store,
    viewer: Option<&Actor>,
    query: CommentQuery,
    page: PageRequest,
) -> Result<PageResponse<CommentView>, AppError> {
    let rows = store.list_comments(&query, &page).await?;
    Ok(PageResponse::from_rows(rows, &page, |c| {
        CommentView::render(c, viewer)
    }))
}

/// Direct replies (one level), oldest first by default.
pub async fn replies(
    store: &dyn Store,
    viewer: Option<&Actor>,
    id: i64,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    load(store, id).await?;
    let page = params.into_request(Direction::Asc);
    let query = CommentQuery {
        parent: ParentFilter::RepliesTo(id),
        deleted: Some(false),
        order: page.direction,
        ..Default::default()
    };
    list(store, viewer, query, page).await
}

/// Top-level comments of a post, newest first by default.
pub async fn top_level(
    store: &dyn Store,
    viewer: Option<&Actor>,
    post_id: i64,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    super::post::load(store, post_id).await?;
    let page = params.into_request(Direction::Desc);
    let query = CommentQuery {
        post_id: Some(post_id),
        parent: ParentFilter::TopLevel,
        deleted: Some(false),
        order: page.direction,
        ..Default::default()
    };
    list(store, viewer, query, page).await
}

/// Top-level page where each entry carries its first replies and its reply count.
pub async fn threaded(
    store: &dyn Store,
    viewer: Option<&Actor>,
    post_id: i64,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    let mut page = top_level(store, viewer, post_id, params).await?;
    let preview = PageRequest::new(0, REPLY_PREVIEW_COUNT as i64, Direction::Asc);

    let mut threads = Vec::with_capacity(page.content.len());
    for view in std::mem::take(&mut page.content) {
        let query = CommentQuery {
            parent: ParentFilter::RepliesTo(view.id),
            deleted: Some(false),
            order: Direction::Asc,
            ..Default::default()
        };
        let rows = store.list_comments(&query, &preview).await?;
        let replies = rows
            .rows
            .into_iter()
            .map(|c| CommentView::render(c, viewer))
            .collect();
        threads.push(view.with_replies(replies));
    }
    page.content = threads;
    Ok(page)
}

/// The actor's own visible history.
pub async fn mine(
    store: &dyn Store,
    actor: &Actor,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    by_user(store, Some(actor), actor.id, params).await
}

/// A user's visible comments.
pub async fn by_user(
    store: &dyn Store,
    viewer: Option<&Actor>,
    user_id: i64,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::not_found("User", user_id));
    }
    let page = params.into_request(Direction::Desc);
    let query = CommentQuery {
        user_id: Some(user_id),
        deleted: Some(false),
        active: Some(true),
        order: page.direction,
        ..Default::default()
    };
    list(store, viewer, query, page).await
}
