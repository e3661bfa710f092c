// src/services/post.rs

use chrono::Utc;

use super::access::require_owner;
use crate::error::AppError;
use crate::models::{
    category::{CategoryView, PostCategory},
    pagination::{Direction, PageParams, PageResponse},
    post::{
        CategoryStat, CreatePostRequest, NewPost, Post, PostFlag, PostQuery, PostSort, PostStatus,
        PostSummary, PostView, UpdatePostRequest, clamp_flagged_limit, published_after_transition,
    },
    user::Actor,
};
use crate::store::Store;
use crate::utils::{
    html::clean_html,
    slug::{generate_unique_slug, is_valid_slug},
};

pub(crate) async fn load(store: &dyn Store, id: i64) -> Result<Post, AppError> {
    store
        .find_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("Post", id))
}

/// Comma-separated, trimmed, empties dropped. Blank input clears.
fn normalize_tags(tags: &str) -> Option<String> {
    let joined = tags
        .split([',', '，'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn sanitized_content(raw: &str) -> Result<String, AppError> {
    let content = clean_html(raw);
    if content.is_empty() {
        return Err(AppError::invalid_field("content", "Content must not be empty"));
    }
    Ok(content)
}

fn parse_status(code: Option<&str>) -> Result<Option<PostStatus>, AppError> {
    code.map(PostStatus::from_code).transpose()
}

pub async fn create(
    store: &dyn Store,
    actor: &Actor,
    req: CreatePostRequest,
) -> Result<PostView, AppError> {
    let category = PostCategory::parse_input(&req.category)?;
    let status = parse_status(req.status.as_deref())?.unwrap_or(PostStatus::Draft);
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::invalid_field("title", "Title must not be empty"));
    }
    let now = Utc::now();

    let post = store
        .insert_post(NewPost {
            slug: generate_unique_slug(&title),
            title,
            content: sanitized_content(&req.content)?,
            author_id: actor.id,
            status,
            category,
            tags: req.tags.as_deref().and_then(normalize_tags),
            cover_image: req.cover_image.as_deref().and_then(blank_to_none),
            created_at: now,
            published_at: (status == PostStatus::Published).then_some(now),
        })
        .await?;

    tracing::info!("User {} created post {} ({})", actor.id, post.id, post.status.code());
    Ok(PostView::render(post, Some(actor.id)))
}

/// Owner-only partial update. A changed title regenerates the slug.
pub async fn update(
    store: &dyn Store,
    actor: &Actor,
    id: i64,
    req: UpdatePostRequest,
) -> Result<PostView, AppError> {
    let mut post = load(store, id).await?;
    require_owner(actor, post.author_id, "You can only edit your own posts")?;
    let now = Utc::now();

    if let Some(title) = req.title.as_deref().map(str::trim) {
        if title.is_empty() {
            return Err(AppError::invalid_field("title", "Title must not be empty"));
        }
        if title != post.title {
            post.title = title.to_string();
            post.slug = generate_unique_slug(title);
        }
    }
    if let Some(content) = req.content.as_deref() {
        post.content = sanitized_content(content)?;
    }
    if let Some(category) = req.category.as_deref() {
        post.category = PostCategory::parse_input(category)?;
    }
    if let Some(tags) = req.tags.as_deref() {
        post.tags = normalize_tags(tags);
    }
    if let Some(cover) = req.cover_image.as_deref() {
        post.cover_image = blank_to_none(cover);
    }
    if let Some(status) = parse_status(req.status.as_deref())? {
        post.published_at = published_after_transition(post.status, status, post.published_at, now);
        post.status = status;
    }
    post.updated_at = now;

    store.save_post(&post).await?;
    Ok(PostView::render(load(store, id).await?, Some(actor.id)))
}

/// Owner-only. The post's live comments are soft-deleted with it.
pub async fn delete(store: &dyn Store, actor: &Actor, id: i64) -> Result<(), AppError> {
    let post = load(store, id).await?;
    require_owner(actor, post.author_id, "You can only delete your own posts")?;

    let cascaded = store
        .delete_post_cascade(id, actor.id, "Post deleted by author", Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Post", id))?;

    tracing::info!("User {} deleted post {} ({} comments cascaded)", actor.id, id, cascaded);
    Ok(())
}

/// Owner-only shortcut for `status = PUBLISHED`.
pub async fn publish(store: &dyn Store, actor: &Actor, id: i64) -> Result<PostView, AppError> {
    let mut post = load(store, id).await?;
    require_owner(actor, post.author_id, "You can only publish your own posts")?;
    if post.status == PostStatus::Published {
        return Err(AppError::Conflict("Post is already published".to_string()));
    }

    let now = Utc::now();
    post.published_at = published_after_transition(post.status, PostStatus::Published, post.published_at, now);
    post.status = PostStatus::Published;
    post.updated_at = now;
    store.save_post(&post).await?;

    Ok(PostView::render(load(store, id).await?, Some(actor.id)))
}

pub async fn get_by_id(store: &dyn Store, viewer: Option<&Actor>, id: i64) -> Result<PostView, AppError> {
    let post = load(store, id).await?;
    Ok(PostView::render(post, viewer.map(|a| a.id)))
}

/// Public. Counts a view only for PUBLISHED posts; other statuses are still
/// returned as a preview.
pub async fn get_by_slug(
    store: &dyn Store,
    viewer: Option<&Actor>,
    slug: &str,
) -> Result<PostView, AppError> {
    let not_found = || AppError::not_found_by("Post", "slug", slug);
    if !is_valid_slug(slug) {
        return Err(not_found());
    }
    let mut post = store.find_post_by_slug(slug).await?.ok_or_else(not_found)?;

    if post.status == PostStatus::Published {
        store.increment_view_count(post.id).await?;
        post.view_count += 1;
    }
    Ok(PostView::render(post, viewer.map(|a| a.id)))
}

async fn list_summaries(
    store: &dyn Store,
    query: PostQuery,
    params: PageParams,
    allowed: &[PostSort],
    default_sort: PostSort,
) -> Result<PageResponse<PostSummary>, AppError> {
    let page = params.into_request(Direction::Desc);
    let sort = PostSort::resolve(&page, allowed, default_sort)?;
    let rows = store.list_posts(&query, sort, &page).await?;
    Ok(PageResponse::from_rows(rows, &page, PostSummary::from))
}

/// The actor's own posts in every status.
pub async fn mine(
    store: &dyn Store,
    actor: &Actor,
    params: PageParams,
) -> Result<PageResponse<PostSummary>, AppError> {
    let query = PostQuery {
        author_id: Some(actor.id),
        ..Default::default()
    };
    list_summaries(store, query, params, &PostSort::FEED, PostSort::CreatedAt).await
}

/// Published posts, newest first unless asked otherwise.
pub async fn feed(store: &dyn Store, params: PageParams) -> Result<PageResponse<PostSummary>, AppError> {
    let query = PostQuery {
        status: Some(PostStatus::Published),
        ..Default::default()
    };
    list_summaries(store, query, params, &PostSort::FEED, PostSort::PublishedAt).await
}

pub async fn by_category(
    store: &dyn Store,
    category: &str,
    params: PageParams,
) -> Result<PageResponse<PostSummary>, AppError> {
    let query = PostQuery {
        status: Some(PostStatus::Published),
        category: Some(PostCategory::parse_input(category)?),
        ..Default::default()
    };
    list_summaries(store, query, params, &PostSort::FEED, PostSort::PublishedAt).await
}

/// Title/content match over published posts.
pub async fn search(
    store: &dyn Store,
    keyword: Option<&str>,
    params: PageParams,
) -> Result<PageResponse<PostSummary>, AppError> {
    let keyword = keyword
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::invalid_field("keyword", "Search keyword must not be empty"))?;
    let query = PostQuery {
        status: Some(PostStatus::Published),
        keyword: Some(keyword.to_string()),
        ..Default::default()
    };
    list_summaries(store, query, params, &PostSort::FEED, PostSort::PublishedAt).await
}

pub async fn flagged(
    store: &dyn Store,
    flag: PostFlag,
    limit: Option<i64>,
) -> Result<Vec<PostSummary>, AppError> {
    let posts = store.list_flagged_posts(flag, clamp_flagged_limit(limit)).await?;
    Ok(posts.into_iter().map(PostSummary::from).collect())
}

pub fn categories() -> Vec<CategoryView> {
    PostCategory::ALL.into_iter().map(CategoryView::from).collect()
}

/// One entry per category, zero-filled.
pub async fn category_stats(
    store: &dyn Store,
    status: Option<PostStatus>,
) -> Result<Vec<CategoryStat>, AppError> {
    let counts = store.count_posts_by_category(status).await?;
    Ok(PostCategory::ALL
        .into_iter()
        .map(|category| CategoryStat {
            category: category.code(),
            display_name: category.display_name(),
            count: counts
                .iter()
                .find(|(c, _)| *c == category)
                .map_or(0, |(_, n)| *n),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::UserRole;
    use crate::services::test_support::{seed_post, seed_user};
    use crate::store::MemoryStore;

    fn create_req(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: "<p>内容</p><script>alert(1)</script>".to_string(),
            category: "饮食推荐".to_string(),
            tags: Some(" food ，canteen, ,".to_string()),
            cover_image: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_draft_with_slug_and_clean_content() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;

        let view = create(&store, &alice, create_req("食堂推荐！")).await.unwrap();

        assert_eq!(view.status, PostStatus::Draft);
        assert_eq!(view.category, PostCategory::Dining);
        assert!(view.slug.starts_with("shi-tang-tui-jian-"));
        assert_eq!(view.content, "<p>内容</p>");
        assert_eq!(view.tags.as_deref(), Some("food,canteen"));
        assert!(view.published_at.is_none());
        assert!(view.can_edit);
    }

    #[tokio::test]
    async fn create_published_stamps_published_at() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let mut req = create_req("hello");
        req.status = Some("published".into());

        let view = create(&store, &alice, req).await.unwrap();
        assert_eq!(view.status, PostStatus::Published);
        assert!(view.published_at.is_some());
    }

    #[tokio::test]
    async fn update_is_owner_only_and_partial() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let bob = seed_user(&store, "bob", UserRole::Admin).await;
        let post = seed_post(&store, &alice, PostStatus::Draft).await;

        let err = update(&store, &bob, post.id, UpdatePostRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let req = UpdatePostRequest {
            tags: Some("exam".into()),
            ..Default::default()
        };
        let view = update(&store, &alice, post.id, req).await.unwrap();
        assert_eq!(view.title, post.title);
        assert_eq!(view.slug, post.slug);
        assert_eq!(view.tags.as_deref(), Some("exam"));

        let req = UpdatePostRequest {
            title: Some("Final exam notes".into()),
            ..Default::default()
        };
        let view = update(&store, &alice, post.id, req).await.unwrap();
        assert!(view.slug.starts_with("final-exam-notes-"));
    }

    #[tokio::test]
    async fn published_at_follows_transitions() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let post = seed_post(&store, &alice, PostStatus::Draft).await;
        let status = |s: &str| UpdatePostRequest {
            status: Some(s.to_string()),
            ..Default::default()
        };

        let first = publish(&store, &alice, post.id).await.unwrap().published_at.unwrap();

        // PUBLISHED -> PUBLISHED keeps the stamp
        let same = update(&store, &alice, post.id, status("PUBLISHED")).await.unwrap();
        assert_eq!(same.published_at, Some(first));

        // leaving keeps it too
        let hidden = update(&store, &alice, post.id, status("HIDDEN")).await.unwrap();
        assert_eq!(hidden.published_at, Some(first));

        // re-entry re-stamps
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let again = update(&store, &alice, post.id, status("PUBLISHED")).await.unwrap();
        assert!(again.published_at.unwrap() > first);
    }

    #[tokio::test]
    async fn publish_twice_is_conflict() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;

        let err = publish(&store, &alice, post.id).await.unwrap_err();
        assert_eq!(err, AppError::Conflict("Post is already published".into()));
    }

    #[tokio::test]
    async fn slug_view_counts_only_published() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let draft = seed_post(&store, &alice, PostStatus::Draft).await;
        let live = seed_post(&store, &alice, PostStatus::Published).await;

        let v = get_by_slug(&store, None, &draft.slug).await.unwrap();
        assert_eq!(v.view_count, 0);
        assert_eq!(load(&store, draft.id).await.unwrap().view_count, 0);

        get_by_slug(&store, None, &live.slug).await.unwrap();
        let v = get_by_slug(&store, None, &live.slug).await.unwrap();
        assert_eq!(v.view_count, 2);

        let err = get_by_slug(&store, None, "no-such-post").await.unwrap_err();
        assert_eq!(err.to_string(), "Post with slug 'no-such-post' not found");
    }

    #[tokio::test]
    async fn feed_only_lists_published_and_rejects_unknown_sort() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        seed_post(&store, &alice, PostStatus::Draft).await;
        seed_post(&store, &alice, PostStatus::Published).await;
        seed_post(&store, &alice, PostStatus::Hidden).await;

        let page = feed(&store, PageParams::default()).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert!(page.content.iter().all(|p| p.status == PostStatus::Published));

        let bad = PageParams {
            sort: Some("title".into()),
            ..Default::default()
        };
        assert!(matches!(
            feed(&store, bad).await,
            Err(AppError::Validation { .. })
        ));

        // past the end: empty page, real total
        let far = PageParams {
            page: Some(9),
            ..Default::default()
        };
        let page = feed(&store, far).await.unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn search_matches_title_or_content_case_insensitively() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let mut req = create_req("Rust Study Group");
        req.status = Some("PUBLISHED".into());
        create(&store, &alice, req).await.unwrap();
        seed_post(&store, &alice, PostStatus::Published).await;

        let page = search(&store, Some("rust"), PageParams::default()).await.unwrap();
        assert_eq!(page.total_elements, 1);
        let page = search(&store, Some("麻辣烫"), PageParams::default()).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert!(search(&store, Some("  "), PageParams::default()).await.is_err());
    }

    #[tokio::test]
    async fn owner_delete_cascades_comments() {
        use crate::models::comment::NewComment;

        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let cid = store
            .insert_comment(NewComment {
                content: "hi".into(),
                user_id: alice.id,
                post_id: post.id,
                parent_comment_id: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        delete(&store, &alice, post.id).await.unwrap();

        assert!(store.find_post(post.id).await.unwrap().is_none());
        let orphan = store.find_comment(cid).await.unwrap().unwrap();
        assert!(orphan.is_deleted);
        assert_eq!(orphan.deleted_by, Some(alice.id));
    }

    #[tokio::test]
    async fn category_stats_are_zero_filled() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        seed_post(&store, &alice, PostStatus::Published).await;
        seed_post(&store, &alice, PostStatus::Draft).await;

        let stats = category_stats(&store, Some(PostStatus::Published)).await.unwrap();
        assert_eq!(stats.len(), 20);
        let dining = stats.iter().find(|s| s.category == "dining").unwrap();
        assert_eq!(dining.count, 1);
        assert_eq!(stats.iter().map(|s| s.count).sum::<i64>(), 1);
    }
}
