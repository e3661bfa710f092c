// src/store/mod.rs

//! Relational-store boundary.
//!
//! Every operation that touches more than one row (comment insert plus
//! counter bump, soft delete plus counter drop, post delete plus comment
//! cascade) is one atomic unit inside the implementation. Batch operations
//! never share a unit across items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{
    category::PostCategory,
    comment::{Comment, CommentQuery, CounterPolicy, NewComment},
    emotion::{Emotion, EmotionTarget, NewEmotion},
    pagination::{PageRequest, RowPage},
    post::{NewPost, Post, PostFlag, PostQuery, PostSort, PostStatus},
    user::{NewUser, User, UserQuery},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Sortable user columns for admin listings.
pub const USER_SORTS: [&str; 3] = ["created_at", "username", "id"];

#[async_trait]
pub trait Store: Send + Sync {
    // --- users ---

    /// Fails with `Conflict` if username or email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Writes email, avatar_url, bio and updated_at.
    async fn update_user_profile(&self, user: &User) -> Result<(), AppError>;
    async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Returns false if no such user.
    async fn set_user_enabled(&self, id: i64, enabled: bool, now: DateTime<Utc>) -> Result<bool, AppError>;
    /// Returns false if no such user.
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;
    /// `sort_column` comes from [`USER_SORTS`].
    async fn list_users(
        &self,
        query: &UserQuery,
        sort_column: &'static str,
        page: &PageRequest,
    ) -> Result<RowPage<User>, AppError>;

    // --- posts ---

    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError>;
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError>;
    /// Persists the editable fields and flags. Counters are never written here.
    async fn save_post(&self, post: &Post) -> Result<(), AppError>;
    async fn increment_view_count(&self, id: i64) -> Result<(), AppError>;
    async fn list_posts(
        &self,
        query: &PostQuery,
        sort: PostSort,
        page: &PageRequest,
    ) -> Result<RowPage<Post>, AppError>;
    /// Published posts carrying `flag`, most recently published first.
    async fn list_flagged_posts(&self, flag: PostFlag, limit: i64) -> Result<Vec<Post>, AppError>;
    /// Post counts per category, optionally restricted to one status.
    async fn count_posts_by_category(
        &self,
        status: Option<PostStatus>,
    ) -> Result<Vec<(PostCategory, i64)>, AppError>;
    /// Soft-deletes the post's live comments, then removes the post.
    /// Returns the number of comments soft-deleted, or None if no such post.
    async fn delete_post_cascade(
        &self,
        id: i64,
        deleted_by: i64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError>;

    // --- comments ---

    /// Inserts the comment and bumps the post's comment_count by one.
    async fn insert_comment(&self, comment: NewComment) -> Result<i64, AppError>;
    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError>;
    async fn update_comment_content(
        &self,
        id: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Marks a live comment deleted. Returns false if it was missing or
    /// already deleted, in which case nothing (counter included) changes.
    async fn soft_delete_comment(
        &self,
        id: i64,
        deleted_by: i64,
        reason: Option<&str>,
        policy: CounterPolicy,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;
    /// Returns false if no such comment. A soft-deleted comment keeps its delete reason.
    async fn set_comment_active(
        &self,
        id: i64,
        active: bool,
        reason: Option<&str>,
    ) -> Result<bool, AppError>;
    /// Physical removal, no counter change, no cascade. Returns false if no such comment.
    async fn hard_delete_comment(&self, id: i64) -> Result<bool, AppError>;
    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: &PageRequest,
    ) -> Result<RowPage<Comment>, AppError>;

    // --- emotions ---

    async fn find_emotion(&self, target: EmotionTarget) -> Result<Option<Emotion>, AppError>;
    /// Insert-or-return-existing: a concurrent writer for the same target wins
    /// and its row is returned.
    async fn insert_emotion(&self, emotion: NewEmotion) -> Result<Emotion, AppError>;
    /// Cached sentiment labels for the user's posts and comments.
    async fn user_sentiments(&self, user_id: i64) -> Result<(Vec<String>, Vec<String>), AppError>;
}
