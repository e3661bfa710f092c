// src/services/admin_comment.rs

//! Comment moderation. Admin soft deletes leave the post's comment_count alone.

use chrono::Utc;

use super::access::require_admin;
use super::comment::load;
use crate::error::AppError;
use crate::models::{
    batch::BatchOutcome,
    comment::{CommentQuery, CommentView, CounterPolicy},
    pagination::{Direction, PageParams, PageResponse},
    user::Actor,
};
use crate::store::Store;

async fn list_where(
    store: &dyn Store,
    query: CommentQuery,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    let page = params.into_request(Direction::Desc);
    let query = CommentQuery {
        order: page.direction,
        ..query
    };
    let rows = store.list_comments(&query, &page).await?;
    Ok(PageResponse::from_rows(rows, &page, CommentView::render_admin))
}

/// All comments, optionally narrowed by deletion state.
pub async fn list(
    store: &dyn Store,
    actor: &Actor,
    is_deleted: Option<bool>,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    require_admin(actor)?;
    let query = CommentQuery {
        deleted: is_deleted,
        ..Default::default()
    };
    list_where(store, query, params).await
}

pub async fn by_user(
    store: &dyn Store,
    actor: &Actor,
    user_id: i64,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    require_admin(actor)?;
    let query = CommentQuery {
        user_id: Some(user_id),
        ..Default::default()
    };
    list_where(store, query, params).await
}

pub async fn by_post(
    store: &dyn Store,
    actor: &Actor,
    post_id: i64,
    params: PageParams,
) -> Result<PageResponse<CommentView>, AppError> {
    require_admin(actor)?;
    let query = CommentQuery {
        post_id: Some(post_id),
        ..Default::default()
    };
    list_where(store, query, params).await
}

pub async fn get(store: &dyn Store, actor: &Actor, id: i64) -> Result<CommentView, AppError> {
    require_admin(actor)?;
    Ok(CommentView::render_admin(load(store, id).await?))
}

async fn soft_delete_one(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    reason: Option<&str>,
) -> Result<bool, AppError> {
    store
        .soft_delete_comment(id, actor.id, reason, CounterPolicy::Keep, Utc::now())
        .await
}

pub async fn soft_delete(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    reason: Option<&str>,
) -> Result<CommentView, AppError> {
    require_admin(actor)?;
    let comment = load(store, id).await?;
    if comment.is_deleted || !soft_delete_one(store, actor, id, reason).await? {
        return Err(AppError::Conflict("Comment already deleted".to_string()));
    }
    tracing::info!("Admin {} soft-deleted comment {}", actor.username, id);
    Ok(CommentView::render_admin(load(store, id).await?))
}

/// Hide (`active = false`) or restore a comment. The text stays stored.
pub async fn set_active(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    active: bool,
    reason: Option<&str>,
) -> Result<CommentView, AppError> {
    require_admin(actor)?;
    if !store.set_comment_active(id, active, reason).await? {
        return Err(AppError::not_found("Comment", id));
    }
    tracing::info!(
        "Admin {} set comment {} active={} (reason: {})",
        actor.username,
        id,
        active,
        reason.unwrap_or("-")
    );
    Ok(CommentView::render_admin(load(store, id).await?))
}

/// Physical removal. Replies keep their now-dangling parent id.
pub async fn hard_delete(store: &dyn Store, actor: &Actor, id: i64) -> Result<(), AppError> {
    require_admin(actor)?;
    if !store.hard_delete_comment(id).await? {
        return Err(AppError::not_found("Comment", id));
    }
    tracing::info!("Admin {} hard-deleted comment {}", actor.username, id);
    Ok(())
}

/// Missing or already-deleted ids are skipped, not failed.
pub async fn batch_soft_delete(
    store: &dyn Store,
    actor: &Actor,
    ids: &[i64],
    reason: Option<&str>,
) -> Result<BatchOutcome, AppError> {
    require_admin(actor)?;
    let mut outcome = BatchOutcome::default();
    for &id in ids {
        match soft_delete_one(store, actor, id, reason).await {
            Ok(true) => outcome.applied(id),
            Ok(false) => outcome.skipped(id, "Comment missing or already deleted"),
            Err(e) => outcome.failed(id, "soft delete", &e),
        }
    }
    tracing::info!(
        "Admin {} batch soft-deleted {}/{} comments",
        actor.username,
        outcome.succeeded,
        outcome.requested
    );
    Ok(outcome)
}

pub async fn batch_hard_delete(
    store: &dyn Store,
    actor: &Actor,
    ids: &[i64],
) -> Result<BatchOutcome, AppError> {
    require_admin(actor)?;
    let mut outcome = BatchOutcome::default();
    for &id in ids {
        match store.hard_delete_comment(id).await {
            Ok(true) => outcome.applied(id),
            Ok(false) => outcome.skipped(id, "Comment not found"),
            Err(e) => outcome.failed(id, "hard delete", &e),
        }
    }
    tracing::info!(
        "Admin {} batch hard-deleted {}/{} comments",
        actor.username,
        outcome.succeeded,
        outcome.requested
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batch::ItemOutcome;
    use crate::models::comment::{CreateCommentRequest, HIDDEN_PLACEHOLDER};
    use crate::models::post::PostStatus;
    use crate::models::role::UserRole;
    use crate::services::comment;
    use crate::services::test_support::{seed_post, seed_user};
    use crate::store::MemoryStore;

    async fn add_comment(store: &MemoryStore, actor: &Actor, post_id: i64, text: &str) -> i64 {
        comment::create(
            store,
            actor,
            CreateCommentRequest {
                post_id,
                content: text.to_string(),
                parent_comment_id: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn non_admins_are_rejected() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice", UserRole::User).await;
        let moderator = seed_user(&store, "mod", UserRole::Moderator).await;

        for actor in [&user, &moderator] {
            let err = list(&store, actor, None, PageParams::default()).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
            let err = batch_hard_delete(&store, actor, &[1]).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn admin_batch_soft_delete_keeps_counter() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let a = add_comment(&store, &alice, post.id, "one").await;
        let b = add_comment(&store, &alice, post.id, "two").await;

        let outcome = batch_soft_delete(&store, &admin, &[a, b, 4242], Some("spam"))
            .await
            .unwrap();
        assert_eq!(outcome.requested, 3);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.items[2].outcome, ItemOutcome::Skipped);

        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.comment_count, 2);

        let view = get(&store, &admin, a).await.unwrap();
        assert!(view.is_deleted);
        assert_eq!(view.content, "one");
        assert_eq!(view.delete_reason.as_deref(), Some("spam"));
        assert_eq!(view.deleted_by, Some(admin.id));

        // second pass: nothing left to delete
        let again = batch_soft_delete(&store, &admin, &[a, b], None).await.unwrap();
        assert_eq!((again.succeeded, again.skipped), (0, 2));
    }

    #[tokio::test]
    async fn single_soft_delete_conflicts_when_repeated() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let id = add_comment(&store, &alice, post.id, "rude").await;

        soft_delete(&store, &admin, id, Some("rude")).await.unwrap();
        let err = soft_delete(&store, &admin, id, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = soft_delete(&store, &admin, 9999, None).await.unwrap_err();
        assert_eq!(err, AppError::not_found("Comment", 9999));
    }

    #[tokio::test]
    async fn hide_then_restore() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let id = add_comment(&store, &alice, post.id, "borderline").await;

        let hidden = set_active(&store, &admin, id, false, Some("review")).await.unwrap();
        assert!(!hidden.is_active);
        assert_eq!(hidden.content, "borderline");
        let public = comment::get(&store, None, id).await.unwrap();
        assert_eq!(public.content, HIDDEN_PLACEHOLDER);

        let restored = set_active(&store, &admin, id, true, None).await.unwrap();
        assert!(restored.is_active);

        let err = set_active(&store, &admin, 777, true, None).await.unwrap_err();
        assert_eq!(err, AppError::not_found("Comment", 777));
    }

    #[tokio::test]
    async fn hiding_a_deleted_comment_keeps_its_delete_reason() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let id = add_comment(&store, &alice, post.id, "buy followers").await;

        soft_delete(&store, &admin, id, Some("spam")).await.unwrap();
        let hidden = set_active(&store, &admin, id, false, Some("review")).await.unwrap();
        assert!(!hidden.is_active);
        assert_eq!(hidden.delete_reason.as_deref(), Some("spam"));

        let restored = set_active(&store, &admin, id, true, None).await.unwrap();
        assert!(restored.is_deleted);
        assert_eq!(restored.delete_reason.as_deref(), Some("spam"));
    }

    #[tokio::test]
    async fn hide_and_restore_do_not_mark_comment_edited() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let id = add_comment(&store, &alice, post.id, "borderline").await;
        let before = get(&store, &admin, id).await.unwrap();

        set_active(&store, &admin, id, false, Some("review")).await.unwrap();
        let restored = set_active(&store, &admin, id, true, None).await.unwrap();
        assert_eq!(restored.updated_at, before.updated_at);
        assert!(!restored.is_edited);
        assert_eq!(restored.delete_reason, None);
    }

    #[tokio::test]
    async fn hard_delete_leaves_replies_in_place() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let bob = seed_user(&store, "bob", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let parent = add_comment(&store, &alice, post.id, "parent").await;
        let reply = comment::create(
            &store,
            &bob,
            CreateCommentRequest {
                post_id: post.id,
                content: "reply".to_string(),
                parent_comment_id: Some(parent),
            },
        )
        .await
        .unwrap();
        assert!(reply.parent_preview.is_some());

        hard_delete(&store, &admin, parent).await.unwrap();

        let orphan = comment::get(&store, None, reply.id).await.unwrap();
        assert_eq!(orphan.content, "reply");
        assert_eq!(orphan.parent_comment_id, Some(parent));
        assert_eq!(orphan.parent_preview, None);
        assert!(orphan.is_reply);

        let post = store.find_post(post.id).await.unwrap().unwrap();
        assert_eq!(post.comment_count, 2);
    }

    #[tokio::test]
    async fn hard_delete_removes_row() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let id = add_comment(&store, &alice, post.id, "gone").await;

        hard_delete(&store, &admin, id).await.unwrap();
        assert_eq!(
            get(&store, &admin, id).await.unwrap_err(),
            AppError::not_found("Comment", id)
        );
        assert!(hard_delete(&store, &admin, id).await.is_err());

        let listed = by_post(&store, &admin, post.id, PageParams::default()).await.unwrap();
        assert_eq!(listed.total_elements, 0);
    }

    #[tokio::test]
    async fn listing_filters_by_deletion_state() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let admin = seed_user(&store, "root", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let a = add_comment(&store, &alice, post.id, "a").await;
        add_comment(&store, &alice, post.id, "b").await;
        comment::delete(&store, &alice, a).await.unwrap();

        let all = list(&store, &admin, None, PageParams::default()).await.unwrap();
        assert_eq!(all.total_elements, 2);
        let deleted = list(&store, &admin, Some(true), PageParams::default()).await.unwrap();
        assert_eq!(deleted.total_elements, 1);
        assert_eq!(deleted.content[0].id, a);
        let by_alice = by_user(&store, &admin, alice.id, PageParams::default()).await.unwrap();
        assert_eq!(by_alice.total_elements, 2);
    }
}
