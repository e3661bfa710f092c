// src/store/memory.rs

//! In-process store over mutex-guarded maps. Same contract as `PgStore`,
//! used by the test suites and for running without a database.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use super::Store;
use crate::error::AppError;
use crate::models::{
    category::PostCategory,
    comment::{Comment, CommentQuery, CounterPolicy, NewComment, ParentFilter},
    emotion::{Emotion, EmotionTarget, NewEmotion},
    pagination::{Direction, PageRequest, RowPage},
    post::{NewPost, Post, PostFlag, PostQuery, PostSort, PostStatus},
    user::{NewUser, User, UserQuery},
};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    emotions: BTreeMap<i64, Emotion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn hydrate_post(&self, post: &Post) -> Post {
        let mut post = post.clone();
        let author = self.users.get(&post.author_id);
        post.author_username = author.map(|u| u.username.clone());
        post.author_avatar = author.and_then(|u| u.avatar_url.clone());
        post
    }

    fn hydrate_comment(&self, comment: &Comment) -> Comment {
        let mut c = comment.clone();
        let author = self.users.get(&c.user_id);
        c.username = author.map(|u| u.username.clone());
        c.user_avatar = author.and_then(|u| u.avatar_url.clone());
        c.post_title = self.posts.get(&c.post_id).map(|p| p.title.clone());

        let parent = c.parent_comment_id.and_then(|id| self.comments.get(&id));
        c.parent_content = parent.map(|p| p.content.clone());
        c.parent_is_deleted = parent.map(|p| p.is_deleted);
        c.parent_is_active = parent.map(|p| p.is_active);

        c.reply_count = self
            .comments
            .values()
            .filter(|r| r.parent_comment_id == Some(c.id) && !r.is_deleted)
            .count() as i64;
        c
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }
}

fn paginate<T>(items: Vec<T>, page: &PageRequest) -> RowPage<T> {
    let total = items.len() as i64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let size = usize::try_from(page.size).unwrap_or(0);
    RowPage {
        rows: items.into_iter().skip(offset).take(size).collect(),
        total,
    }
}

/// Nulls sort last regardless of direction.
fn compare_keys(a: Option<i64>, b: Option<i64>, direction: Direction) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => apply(x.cmp(&y), direction),
    }
}

fn apply(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

fn micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn post_key(post: &Post, sort: PostSort) -> Option<i64> {
    match sort {
        PostSort::CreatedAt => Some(micros(post.created_at)),
        PostSort::UpdatedAt => Some(micros(post.updated_at)),
        PostSort::PublishedAt => post.published_at.map(micros),
        PostSort::ViewCount => Some(post.view_count),
        PostSort::CommentCount => Some(post.comment_count),
    }
}

fn post_matches(post: &Post, query: &PostQuery) -> bool {
    if query.status.is_some_and(|s| s != post.status) {
        return false;
    }
    if query.category.is_some_and(|c| c != post.category) {
        return false;
    }
    if query.author_id.is_some_and(|a| a != post.author_id) {
        return false;
    }
    if let Some(keyword) = query.keyword.as_deref() {
        let keyword = keyword.to_lowercase();
        if !post.title.to_lowercase().contains(&keyword)
            && !post.content.to_lowercase().contains(&keyword)
        {
            return false;
        }
    }
    true
}

fn comment_matches(comment: &Comment, query: &CommentQuery) -> bool {
    if query.post_id.is_some_and(|p| p != comment.post_id) {
        return false;
    }
    if query.user_id.is_some_and(|u| u != comment.user_id) {
        return false;
    }
    if query.deleted.is_some_and(|d| d != comment.is_deleted) {
        return false;
    }
    if query.active.is_some_and(|a| a != comment.is_active) {
        return false;
    }
    match query.parent {
        ParentFilter::Any => true,
        ParentFilter::TopLevel => comment.parent_comment_id.is_none(),
        ParentFilter::RepliesTo(parent) => comment.parent_comment_id == Some(parent),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already exists!".to_string()));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already exists!".to_string()));
        }
        let id = inner.next_id();
        let row = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            avatar_url: None,
            bio: None,
            enabled: true,
            locked: false,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        inner.users.insert(id, row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user_profile(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(AppError::Conflict("Email already exists!".to_string()));
        }
        let row = inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("User", user.id))?;
        row.email = user.email.clone();
        row.avatar_url = user.avatar_url.clone();
        row.bio = user.bio.clone();
        row.updated_at = user.updated_at;
        Ok(())
    }

    async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        let row = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("User", id))?;
        row.password_hash = password_hash.to_string();
        row.updated_at = now;
        Ok(())
    }

    async fn set_user_enabled(&self, id: i64, enabled: bool, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut inner = self.lock();
        match inner.users.get_mut(&id) {
            Some(row) => {
                row.enabled = enabled;
                row.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.lock().users.remove(&id).is_some())
    }

    async fn list_users(
        &self,
        query: &UserQuery,
        sort_column: &'static str,
        page: &PageRequest,
    ) -> Result<RowPage<User>, AppError> {
        let inner = self.lock();
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| query.enabled.is_none_or(|e| e == u.enabled))
            .filter(|u| query.role.is_none_or(|r| r == u.role))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            let primary = match sort_column {
                "username" => a.username.cmp(&b.username),
                "id" => a.id.cmp(&b.id),
                _ => a.created_at.cmp(&b.created_at),
            };
            apply(primary.then(a.id.cmp(&b.id)), page.direction)
        });
        Ok(paginate(users, page))
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let mut inner = self.lock();
        if inner.slug_taken(&post.slug, None) {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }
        let id = inner.next_id();
        let row = Post {
            id,
            title: post.title,
            content: post.content,
            slug: post.slug,
            author_id: post.author_id,
            status: post.status,
            category: post.category,
            tags: post.tags,
            cover_image: post.cover_image,
            view_count: 0,
            comment_count: 0,
            is_top: false,
            is_recommended: false,
            created_at: post.created_at,
            updated_at: post.created_at,
            published_at: post.published_at,
            author_username: None,
            author_avatar: None,
        };
        inner.posts.insert(id, row.clone());
        Ok(inner.hydrate_post(&row))
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let inner = self.lock();
        Ok(inner.posts.get(&id).map(|p| inner.hydrate_post(p)))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        let inner = self.lock();
        Ok(inner
            .posts
            .values()
            .find(|p| p.slug == slug)
            .map(|p| inner.hydrate_post(p)))
    }

    async fn save_post(&self, post: &Post) -> Result<(), AppError> {
        let mut inner = self.lock();
        if inner.slug_taken(&post.slug, Some(post.id)) {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }
        let row = inner
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| AppError::not_found("Post", post.id))?;
        row.title = post.title.clone();
        row.content = post.content.clone();
        row.slug = post.slug.clone();
        row.status = post.status;
        row.category = post.category;
        row.tags = post.tags.clone();
        row.cover_image = post.cover_image.clone();
        row.is_top = post.is_top;
        row.is_recommended = post.is_recommended;
        row.updated_at = post.updated_at;
        row.published_at = post.published_at;
        Ok(())
    }

    async fn increment_view_count(&self, id: i64) -> Result<(), AppError> {
        if let Some(row) = self.lock().posts.get_mut(&id) {
            row.view_count += 1;
        }
        Ok(())
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        sort: PostSort,
        page: &PageRequest,
    ) -> Result<RowPage<Post>, AppError> {
        let inner = self.lock();
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| post_matches(p, query))
            .map(|p| inner.hydrate_post(p))
            .collect();
        posts.sort_by(|a, b| {
            compare_keys(post_key(a, sort), post_key(b, sort), page.direction)
                .then(apply(a.id.cmp(&b.id), page.direction))
        });
        Ok(paginate(posts, page))
    }

    async fn list_flagged_posts(&self, flag: PostFlag, limit: i64) -> Result<Vec<Post>, AppError> {
        let inner = self.lock();
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| p.status == PostStatus::Published)
            .filter(|p| match flag {
                PostFlag::Top => p.is_top,
                PostFlag::Recommended => p.is_recommended,
            })
            .map(|p| inner.hydrate_post(p))
            .collect();
        posts.sort_by(|a, b| {
            compare_keys(
                a.published_at.map(micros),
                b.published_at.map(micros),
                Direction::Desc,
            )
            .then(b.id.cmp(&a.id))
        });
        posts.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(posts)
    }

    async fn count_posts_by_category(
        &self,
        status: Option<PostStatus>,
    ) -> Result<Vec<(PostCategory, i64)>, AppError> {
        let inner = self.lock();
        let mut counts: BTreeMap<PostCategory, i64> = BTreeMap::new();
        for post in inner.posts.values() {
            if status.is_none_or(|s| s == post.status) {
                *counts.entry(post.category).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn delete_post_cascade(
        &self,
        id: i64,
        deleted_by: i64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        let mut inner = self.lock();
        if !inner.posts.contains_key(&id) {
            return Ok(None);
        }
        let mut affected = 0;
        for comment in inner.comments.values_mut() {
            if comment.post_id == id && !comment.is_deleted {
                comment.is_deleted = true;
                comment.deleted_by = Some(deleted_by);
                comment.delete_reason = Some(reason.to_string());
                comment.deleted_at = Some(now);
                affected += 1;
            }
        }
        inner.posts.remove(&id);
        Ok(Some(affected))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<i64, AppError> {
        let mut inner = self.lock();
        let post = inner
            .posts
            .get_mut(&comment.post_id)
            .ok_or_else(|| AppError::not_found("Post", comment.post_id))?;
        post.comment_count += 1;

        let id = inner.next_id();
        inner.comments.insert(
            id,
            Comment {
                id,
                content: comment.content,
                user_id: comment.user_id,
                post_id: comment.post_id,
                parent_comment_id: comment.parent_comment_id,
                is_deleted: false,
                is_active: true,
                delete_reason: None,
                deleted_by: None,
                deleted_at: None,
                created_at: comment.created_at,
                updated_at: comment.created_at,
                username: None,
                user_avatar: None,
                post_title: None,
                parent_content: None,
                parent_is_deleted: None,
                parent_is_active: None,
                reply_count: 0,
            },
        );
        Ok(id)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let inner = self.lock();
        Ok(inner.comments.get(&id).map(|c| inner.hydrate_comment(c)))
    }

    async fn update_comment_content(
        &self,
        id: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        let row = inner
            .comments
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Comment", id))?;
        row.content = content.to_string();
        row.updated_at = now;
        Ok(())
    }

    async fn soft_delete_comment(
        &self,
        id: i64,
        deleted_by: i64,
        reason: Option<&str>,
        policy: CounterPolicy,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut inner = self.lock();
        let post_id = match inner.comments.get_mut(&id) {
            Some(row) if !row.is_deleted => {
                row.is_deleted = true;
                row.deleted_by = Some(deleted_by);
                row.delete_reason = reason.map(str::to_string);
                row.deleted_at = Some(now);
                row.post_id
            }
            _ => return Ok(false),
        };
        if policy == CounterPolicy::Decrement {
            if let Some(post) = inner.posts.get_mut(&post_id) {
                post.comment_count = (post.comment_count - 1).max(0);
            }
        }
        Ok(true)
    }

    async fn set_comment_active(
        &self,
        id: i64,
        active: bool,
        reason: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut inner = self.lock();
        let Some(row) = inner.comments.get_mut(&id) else {
            return Ok(false);
        };
        row.is_active = active;
        if !row.is_deleted {
            row.delete_reason = if active { None } else { reason.map(str::to_string) };
        }
        Ok(true)
    }

    async fn hard_delete_comment(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.lock().comments.remove(&id).is_some())
    }

    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: &PageRequest,
    ) -> Result<RowPage<Comment>, AppError> {
        let inner = self.lock();
        let mut comments: Vec<Comment> = inner
            .comments
            .values()
            .filter(|c| comment_matches(c, query))
            .map(|c| inner.hydrate_comment(c))
            .collect();
        comments.sort_by(|a, b| {
            apply(
                a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
                query.order,
            )
        });
        Ok(paginate(comments, page))
    }

    async fn find_emotion(&self, target: EmotionTarget) -> Result<Option<Emotion>, AppError> {
        let inner = self.lock();
        Ok(inner
            .emotions
            .values()
            .find(|e| matches_target(e, target))
            .cloned())
    }

    async fn insert_emotion(&self, emotion: NewEmotion) -> Result<Emotion, AppError> {
        let mut inner = self.lock();
        if let Some(existing) = inner
            .emotions
            .values()
            .find(|e| matches_target(e, emotion.target))
        {
            return Ok(existing.clone());
        }
        let id = inner.next_id();
        let (post_id, comment_id) = match emotion.target {
            EmotionTarget::Post(id) => (Some(id), None),
            EmotionTarget::Comment(id) => (None, Some(id)),
        };
        let row = Emotion {
            id,
            post_id,
            comment_id,
            text: emotion.text,
            sentiment: emotion.sentiment,
            confidence: emotion.confidence,
            probabilities: Json(emotion.probabilities),
            created_at: emotion.created_at,
        };
        inner.emotions.insert(id, row.clone());
        Ok(row)
    }

    async fn user_sentiments(&self, user_id: i64) -> Result<(Vec<String>, Vec<String>), AppError> {
        let inner = self.lock();
        let mut posts = Vec::new();
        let mut comments = Vec::new();
        for emotion in inner.emotions.values() {
            if let Some(post_id) = emotion.post_id {
                if inner.posts.get(&post_id).is_some_and(|p| p.author_id == user_id) {
                    posts.push(emotion.sentiment.clone());
                }
            }
            if let Some(comment_id) = emotion.comment_id {
                if inner
                    .comments
                    .get(&comment_id)
                    .is_some_and(|c| c.user_id == user_id)
                {
                    comments.push(emotion.sentiment.clone());
                }
            }
        }
        Ok((posts, comments))
    }
}

fn matches_target(emotion: &Emotion, target: EmotionTarget) -> bool {
    match target {
        EmotionTarget::Post(id) => emotion.post_id == Some(id),
        EmotionTarget::Comment(id) => emotion.comment_id == Some(id),
    }
}
