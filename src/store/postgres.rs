// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use super::Store;
use crate::error::{AppError, is_unique_violation};
use crate::models::{
    category::PostCategory,
    comment::{Comment, CommentQuery, CounterPolicy, NewComment, ParentFilter},
    emotion::{Emotion, EmotionTarget, NewEmotion},
    pagination::{PageRequest, RowPage},
    post::{NewPost, Post, PostFlag, PostQuery, PostSort, PostStatus},
    user::{NewUser, User, UserQuery},
};

const USER_SELECT: &str = "SELECT id, username, email, password_hash, role, avatar_url, bio, \
     enabled, locked, created_at, updated_at FROM users";

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.slug, p.author_id, p.status, \
     p.category, p.tags, p.cover_image, p.view_count, p.comment_count, p.is_top, \
     p.is_recommended, p.created_at, p.updated_at, p.published_at, \
     u.username AS author_username, u.avatar_url AS author_avatar \
     FROM posts p LEFT JOIN users u ON u.id = p.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.content, c.user_id, c.post_id, \
     c.parent_comment_id, c.is_deleted, c.is_active, c.delete_reason, c.deleted_by, \
     c.deleted_at, c.created_at, c.updated_at, \
     u.username, u.avatar_url AS user_avatar, p.title AS post_title, \
     pc.content AS parent_content, pc.is_deleted AS parent_is_deleted, \
     pc.is_active AS parent_is_active, \
     (SELECT COUNT(*) FROM comments r WHERE r.parent_comment_id = c.id AND NOT r.is_deleted) AS reply_count \
     FROM comments c \
     LEFT JOIN users u ON u.id = c.user_id \
     LEFT JOIN posts p ON p.id = c.post_id \
     LEFT JOIN comments pc ON pc.id = c.parent_comment_id";

const EMOTION_SELECT: &str = "SELECT id, post_id, comment_id, text, sentiment, confidence, \
     probabilities, created_at FROM emotions";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a UNIQUE violation on the users table to the matching conflict.
fn user_conflict(err: sqlx::Error) -> AppError {
    if !is_unique_violation(&err) {
        return err.into();
    }
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint())
        .unwrap_or_default();
    if constraint.contains("email") {
        AppError::Conflict("Email already exists!".to_string())
    } else {
        AppError::Conflict("Username already exists!".to_string())
    }
}

fn slug_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Slug already exists".to_string())
    } else {
        err.into()
    }
}

/// Escapes LIKE wildcards so the keyword matches literally.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_post_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    qb.push(" WHERE TRUE");
    if let Some(status) = query.status {
        qb.push(" AND p.status = ").push_bind(status.code());
    }
    if let Some(category) = query.category {
        qb.push(" AND p.category = ").push_bind(category.code());
    }
    if let Some(author_id) = query.author_id {
        qb.push(" AND p.author_id = ").push_bind(author_id);
    }
    if let Some(keyword) = query.keyword.as_deref() {
        let pattern = like_pattern(keyword);
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_comment_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CommentQuery) {
    qb.push(" WHERE TRUE");
    if let Some(post_id) = query.post_id {
        qb.push(" AND c.post_id = ").push_bind(post_id);
    }
    if let Some(user_id) = query.user_id {
        qb.push(" AND c.user_id = ").push_bind(user_id);
    }
    if let Some(deleted) = query.deleted {
        qb.push(" AND c.is_deleted = ").push_bind(deleted);
    }
    if let Some(active) = query.active {
        qb.push(" AND c.is_active = ").push_bind(active);
    }
    match query.parent {
        ParentFilter::Any => {}
        ParentFilter::TopLevel => {
            qb.push(" AND c.parent_comment_id IS NULL");
        }
        ParentFilter::RepliesTo(parent) => {
            qb.push(" AND c.parent_comment_id = ").push_bind(parent);
        }
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
    qb.push(" WHERE TRUE");
    if let Some(enabled) = query.enabled {
        qb.push(" AND enabled = ").push_bind(enabled);
    }
    if let Some(role) = query.role {
        qb.push(" AND role = ").push_bind(role.code());
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role, enabled, locked, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, TRUE, FALSE, $5, $5) \
             RETURNING id, username, email, password_hash, role, avatar_url, bio, enabled, locked, created_at, updated_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.code())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(user_conflict)?;
        Ok(row)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE username = $1", USER_SELECT))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE email = $1", USER_SELECT))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_profile(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, avatar_url = $3, bio = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.avatar_url)
        .bind(&user.bio)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(user_conflict)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", user.id));
        }
        Ok(())
    }

    async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }

    async fn set_user_enabled(&self, id: i64, enabled: bool, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET enabled = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(
        &self,
        query: &UserQuery,
        sort_column: &'static str,
        page: &PageRequest,
    ) -> Result<RowPage<User>, AppError> {
        let column = match sort_column {
            "username" => "username",
            "id" => "id",
            _ => "created_at",
        };
        let direction = page.direction.as_sql();

        let mut qb = QueryBuilder::<Postgres>::new(USER_SELECT);
        push_user_filters(&mut qb, query);
        qb.push(format!(" ORDER BY {} {}, id {}", column, direction, direction));
        qb.push(" LIMIT ").push_bind(page.size);
        qb.push(" OFFSET ").push_bind(page.offset());
        let rows = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(RowPage { rows, total })
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, AppError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, content, slug, author_id, status, category, tags, cover_image, \
             view_count, comment_count, is_top, is_recommended, created_at, updated_at, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, 0, FALSE, FALSE, $9, $9, $10) RETURNING id",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.slug)
        .bind(post.author_id)
        .bind(post.status.code())
        .bind(post.category.code())
        .bind(&post.tags)
        .bind(&post.cover_image)
        .bind(post.created_at)
        .bind(post.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(slug_conflict)?;

        self.find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", id))
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.slug = $1", POST_SELECT))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn save_post(&self, post: &Post) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE posts SET title = $2, content = $3, slug = $4, status = $5, category = $6, \
             tags = $7, cover_image = $8, is_top = $9, is_recommended = $10, updated_at = $11, \
             published_at = $12 WHERE id = $1",
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.slug)
        .bind(post.status.code())
        .bind(post.category.code())
        .bind(&post.tags)
        .bind(&post.cover_image)
        .bind(post.is_top)
        .bind(post.is_recommended)
        .bind(post.updated_at)
        .bind(post.published_at)
        .execute(&self.pool)
        .await
        .map_err(slug_conflict)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post", post.id));
        }
        Ok(())
    }

    async fn increment_view_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        sort: PostSort,
        page: &PageRequest,
    ) -> Result<RowPage<Post>, AppError> {
        let direction = page.direction.as_sql();

        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_post_filters(&mut qb, query);
        qb.push(format!(
            " ORDER BY p.{} {} NULLS LAST, p.id {}",
            sort.column(),
            direction,
            direction
        ));
        qb.push(" LIMIT ").push_bind(page.size);
        qb.push(" OFFSET ").push_bind(page.offset());
        let rows = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_post_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(RowPage { rows, total })
    }

    async fn list_flagged_posts(&self, flag: PostFlag, limit: i64) -> Result<Vec<Post>, AppError> {
        let column = match flag {
            PostFlag::Top => "is_top",
            PostFlag::Recommended => "is_recommended",
        };
        let sql = format!(
            "{} WHERE p.status = $1 AND p.{} ORDER BY p.published_at DESC NULLS LAST, p.id DESC LIMIT $2",
            POST_SELECT, column
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(PostStatus::Published.code())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn count_posts_by_category(
        &self,
        status: Option<PostStatus>,
    ) -> Result<Vec<(PostCategory, i64)>, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT category, COUNT(*) FROM posts \
             WHERE ($1::TEXT IS NULL OR status = $1) GROUP BY category",
        )
        .bind(status.map(PostStatus::code))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(code, count)| Ok((PostCategory::try_from(code)?, count)))
            .collect()
    }

    async fn delete_post_cascade(
        &self,
        id: i64,
        deleted_by: i64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let cascaded = sqlx::query(
            "UPDATE comments SET is_deleted = TRUE, deleted_by = $2, delete_reason = $3, deleted_at = $4 \
             WHERE post_id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .bind(deleted_by)
        .bind(reason)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(cascaded))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (content, user_id, post_id, parent_comment_id, is_deleted, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, FALSE, TRUE, $5, $5) RETURNING id",
        )
        .bind(&comment.content)
        .bind(comment.user_id)
        .bind(comment.post_id)
        .bind(comment.parent_comment_id)
        .bind(comment.created_at)
        .fetch_one(&mut *tx)
        .await?;

        let bumped = sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            // dropping the transaction rolls the insert back
            return Err(AppError::not_found("Post", comment.post_id));
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(&format!("{} WHERE c.id = $1", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn update_comment_content(
        &self,
        id: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE comments SET content = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(content)
            .bind(now)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Comment", id));
        }
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
        let mut tx = self.pool.begin().await?;

        let post_id: Option<i64> = sqlx::query_scalar(
            "UPDATE comments SET is_deleted = TRUE, deleted_by = $2, delete_reason = $3, deleted_at = $4 \
             WHERE id = $1 AND NOT is_deleted RETURNING post_id",
        )
        .bind(id)
        .bind(deleted_by)
        .bind(reason)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(post_id) = post_id else {
            return Ok(false);
        };

        if policy == CounterPolicy::Decrement {
            sqlx::query("UPDATE posts SET comment_count = GREATEST(0, comment_count - 1) WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn set_comment_active(
        &self,
        id: i64,
        active: bool,
        reason: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE comments SET is_active = $2, \
             delete_reason = CASE WHEN is_deleted THEN delete_reason WHEN $2 THEN NULL ELSE $3 END \
             WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn hard_delete_comment(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: &PageRequest,
    ) -> Result<RowPage<Comment>, AppError> {
        let direction = query.order.as_sql();

        let mut qb = QueryBuilder::<Postgres>::new(COMMENT_SELECT);
        push_comment_filters(&mut qb, query);
        qb.push(format!(" ORDER BY c.created_at {}, c.id {}", direction, direction));
        qb.push(" LIMIT ").push_bind(page.size);
        qb.push(" OFFSET ").push_bind(page.offset());
        let rows = qb.build_query_as::<Comment>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM comments c");
        push_comment_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(RowPage { rows, total })
    }

    async fn find_emotion(&self, target: EmotionTarget) -> Result<Option<Emotion>, AppError> {
        let (column, id) = match target {
            EmotionTarget::Post(id) => ("post_id", id),
            EmotionTarget::Comment(id) => ("comment_id", id),
        };
        let emotion = sqlx::query_as::<_, Emotion>(&format!("{} WHERE {} = $1", EMOTION_SELECT, column))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(emotion)
    }

    async fn insert_emotion(&self, emotion: NewEmotion) -> Result<Emotion, AppError> {
        let (post_id, comment_id) = match emotion.target {
            EmotionTarget::Post(id) => (Some(id), None),
            EmotionTarget::Comment(id) => (None, Some(id)),
        };

        let inserted = sqlx::query_as::<_, Emotion>(
            "INSERT INTO emotions (post_id, comment_id, text, sentiment, confidence, probabilities, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT DO NOTHING \
             RETURNING id, post_id, comment_id, text, sentiment, confidence, probabilities, created_at",
        )
        .bind(post_id)
        .bind(comment_id)
        .bind(&emotion.text)
        .bind(&emotion.sentiment)
        .bind(emotion.confidence)
        .bind(Json(&emotion.probabilities))
        .bind(emotion.created_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            // lost the race: another request cached this target first
            None => self.find_emotion(emotion.target).await?.ok_or_else(|| {
                AppError::InternalServerError("Emotion row vanished after conflict".to_string())
            }),
        }
    }

    async fn user_sentiments(&self, user_id: i64) -> Result<(Vec<String>, Vec<String>), AppError> {
        let posts: Vec<String> = sqlx::query_scalar(
            "SELECT e.sentiment FROM emotions e JOIN posts p ON p.id = e.post_id WHERE p.author_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let comments: Vec<String> = sqlx::query_scalar(
            "SELECT e.sentiment FROM emotions e JOIN comments c ON c.id = e.comment_id WHERE c.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((posts, comments))
    }
}
