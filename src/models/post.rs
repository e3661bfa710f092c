// src/models/post.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use utoipa::ToSchema;
use validator::Validate;

use super::category::PostCategory;
use super::pagination::PageRequest;
use crate::error::AppError;

pub const SUMMARY_CHARS: usize = 150;
pub const DEFAULT_FLAGGED_LIMIT: i64 = 5;
pub const MAX_FLAGGED_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    Draft,
    Published,
    Hidden,
    Deleted,
}

impl PostStatus {
    pub const ALL: [PostStatus; 4] = [
        PostStatus::Draft,
        PostStatus::Published,
        PostStatus::Hidden,
        PostStatus::Deleted,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PostStatus::Draft => "DRAFT",
            PostStatus::Published => "PUBLISHED",
            PostStatus::Hidden => "HIDDEN",
            PostStatus::Deleted => "DELETED",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PostStatus::Draft => "草稿",
            PostStatus::Published => "已发布",
            PostStatus::Hidden => "已隐藏",
            PostStatus::Deleted => "已删除",
        }
    }

    pub fn from_code(code: &str) -> Result<PostStatus, AppError> {
        let upper = code.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|s| s.code() == upper)
            .ok_or_else(|| AppError::invalid_field("status", format!("Unknown post status: {}", code)))
    }
}

impl TryFrom<String> for PostStatus {
    type Error = AppError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code)
    }
}

/// publishedAt after moving `from -> to`: entering PUBLISHED from any other
/// state stamps `now`, every other transition keeps the current value.
pub fn published_after_transition(
    from: PostStatus,
    to: PostStatus,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if to == PostStatus::Published && from != PostStatus::Published {
        Some(now)
    } else {
        current
    }
}

/// Bounds the size of top/recommended lists.
pub fn clamp_flagged_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_FLAGGED_LIMIT)
        .clamp(1, MAX_FLAGGED_LIMIT)
}

/// Represents the 'posts' table joined with the author's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub author_id: i64,
    #[sqlx(try_from = "String")]
    pub status: PostStatus,
    #[sqlx(try_from = "String")]
    pub category: PostCategory,
    pub tags: Option<String>,
    pub cover_image: Option<String>,

    // Denormalized counters, written only through the store's counter paths.
    pub view_count: i64,
    pub comment_count: i64,

    pub is_top: bool,
    pub is_recommended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,

    pub author_username: Option<String>,
    pub author_avatar: Option<String>,
}

/// Insert payload for a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub author_id: i64,
    pub status: PostStatus,
    pub category: PostCategory,
    pub tags: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Filters for paginated post listings. `None` means "any".
#[derive(Debug, Default, Clone)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub category: Option<PostCategory>,
    pub author_id: Option<i64>,
    /// Case-insensitive match against title or content.
    pub keyword: Option<String>,
}

/// Sortable post columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSort {
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ViewCount,
    CommentCount,
}

impl PostSort {
    pub const FEED: [PostSort; 5] = [
        PostSort::PublishedAt,
        PostSort::CreatedAt,
        PostSort::UpdatedAt,
        PostSort::ViewCount,
        PostSort::CommentCount,
    ];

    pub const ADMIN: [PostSort; 4] = [
        PostSort::CreatedAt,
        PostSort::UpdatedAt,
        PostSort::ViewCount,
        PostSort::CommentCount,
    ];

    pub fn column(self) -> &'static str {
        match self {
            PostSort::CreatedAt => "created_at",
            PostSort::UpdatedAt => "updated_at",
            PostSort::PublishedAt => "published_at",
            PostSort::ViewCount => "view_count",
            PostSort::CommentCount => "comment_count",
        }
    }

    /// Resolves `page.sort` against `allowed`; unknown columns are rejected.
    pub fn resolve(
        page: &PageRequest,
        allowed: &[PostSort],
        default: PostSort,
    ) -> Result<PostSort, AppError> {
        let columns: Vec<&'static str> = allowed.iter().map(|s| s.column()).collect();
        let column = page.sort_column(&columns, default.column())?;
        Ok(allowed
            .iter()
            .copied()
            .find(|s| s.column() == column)
            .unwrap_or(default))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFlag {
    Top,
    Recommended,
}

/// Per-category count of posts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: &'static str,
    pub display_name: &'static str,
    pub count: i64,
}

/// `{code, displayName}` pair for status listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub code: &'static str,
    pub display_name: &'static str,
}

impl From<PostStatus> for StatusView {
    fn from(s: PostStatus) -> Self {
        StatusView {
            code: s.code(),
            display_name: s.display_name(),
        }
    }
}

/// Full post rendering.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub status: PostStatus,
    pub status_name: String,
    pub category: PostCategory,
    pub category_name: String,
    pub tags: Option<String>,
    pub cover_image: Option<String>,
    pub view_count: i64,
    pub comment_count: i64,
    pub is_top: bool,
    pub is_recommended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub can_edit: bool,
}

impl PostView {
    pub fn render(post: Post, viewer_id: Option<i64>) -> Self {
        PostView {
            can_edit: viewer_id == Some(post.author_id),
            status_name: post.status.display_name().to_string(),
            category_name: post.category.display_name().to_string(),
            id: post.id,
            title: post.title,
            content: post.content,
            slug: post.slug,
            author_id: post.author_id,
            author_name: post.author_username,
            author_avatar: post.author_avatar,
            status: post.status,
            category: post.category,
            tags: post.tags,
            cover_image: post.cover_image,
            view_count: post.view_count,
            comment_count: post.comment_count,
            is_top: post.is_top,
            is_recommended: post.is_recommended,
            created_at: post.created_at,
            updated_at: post.updated_at,
            published_at: post.published_at,
        }
    }
}

/// Feed item: the post without its body, plus a short summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub slug: String,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub status: PostStatus,
    pub category: PostCategory,
    pub category_name: String,
    pub tags: Option<String>,
    pub cover_image: Option<String>,
    pub view_count: i64,
    pub comment_count: i64,
    pub is_top: bool,
    pub is_recommended: bool,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        PostSummary {
            summary: summarize(&post.content, SUMMARY_CHARS),
            category_name: post.category.display_name().to_string(),
            id: post.id,
            title: post.title,
            slug: post.slug,
            author_id: post.author_id,
            author_name: post.author_username,
            author_avatar: post.author_avatar,
            status: post.status,
            category: post.category,
            tags: post.tags,
            cover_image: post.cover_image,
            view_count: post.view_count,
            comment_count: post.comment_count,
            is_top: post.is_top,
            is_recommended: post.is_recommended,
            created_at: post.created_at,
            published_at: post.published_at,
        }
    }
}

/// First `max` characters, with "..." appended when the text was cut.
pub fn summarize(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub(crate) fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url")
            .with_message("Must be a valid URL".into()));
    }
    Ok(())
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 50000,
        message = "Content length must be between 1 and 50000 chars"
    ))]
    pub content: String,

    #[validate(length(min = 1, max = 50, message = "Category is required"))]
    pub category: String,

    #[validate(length(max = 500, message = "Tags must be at most 500 chars"))]
    pub tags: Option<String>,

    #[validate(
        length(max = 500, message = "Cover image URL must be at most 500 chars"),
        custom(function = validate_url_string)
    )]
    pub cover_image: Option<String>,

    /// Defaults to DRAFT.
    pub status: Option<String>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 50000,
        message = "Content length must be between 1 and 50000 chars"
    ))]
    pub content: Option<String>,

    pub category: Option<String>,

    #[validate(length(max = 500, message = "Tags must be at most 500 chars"))]
    pub tags: Option<String>,

    #[validate(
        length(max = 500, message = "Cover image URL must be at most 500 chars"),
        custom(function = validate_url_string)
    )]
    pub cover_image: Option<String>,

    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn entering_published_stamps_now() {
        let now = Utc::now();
        let earlier = now - Duration::days(3);

        assert_eq!(
            published_after_transition(PostStatus::Draft, PostStatus::Published, None, now),
            Some(now)
        );
        // re-entry from HIDDEN re-stamps
        assert_eq!(
            published_after_transition(PostStatus::Hidden, PostStatus::Published, Some(earlier), now),
            Some(now)
        );
        // already published: untouched
        assert_eq!(
            published_after_transition(PostStatus::Published, PostStatus::Published, Some(earlier), now),
            Some(earlier)
        );
        // leaving published keeps the stamp
        assert_eq!(
            published_after_transition(PostStatus::Published, PostStatus::Hidden, Some(earlier), now),
            Some(earlier)
        );
    }

    #[test]
    fn status_codes_parse_case_insensitively() {
        assert_eq!(PostStatus::from_code("published").unwrap(), PostStatus::Published);
        assert_eq!(PostStatus::from_code("HIDDEN").unwrap(), PostStatus::Hidden);
        assert!(PostStatus::from_code("ARCHIVED").is_err());
    }

    #[test]
    fn summary_cuts_on_characters() {
        assert_eq!(summarize("short", 150), "short");
        let long: String = "食".repeat(200);
        let s = summarize(&long, 150);
        assert_eq!(s.chars().count(), 153);
        assert!(s.ends_with("..."));
        assert_eq!(summarize(&"a".repeat(150), 150), "a".repeat(150));
    }

    #[test]
    fn admin_sort_rejects_published_at() {
        use super::super::pagination::{Direction, PageParams};

        let page = PageParams {
            sort: Some("view_count".into()),
            ..Default::default()
        }
        .into_request(Direction::Desc);
        assert_eq!(
            PostSort::resolve(&page, &PostSort::ADMIN, PostSort::CreatedAt).unwrap(),
            PostSort::ViewCount
        );

        let page = PageParams {
            sort: Some("published_at".into()),
            ..Default::default()
        }
        .into_request(Direction::Desc);
        assert!(PostSort::resolve(&page, &PostSort::ADMIN, PostSort::CreatedAt).is_err());
        assert_eq!(
            PostSort::resolve(&page, &PostSort::FEED, PostSort::PublishedAt).unwrap(),
            PostSort::PublishedAt
        );
    }

    #[test]
    fn flagged_limit_is_bounded() {
        assert_eq!(clamp_flagged_limit(None), 5);
        assert_eq!(clamp_flagged_limit(Some(0)), 1);
        assert_eq!(clamp_flagged_limit(Some(500)), 50);
    }

    #[test]
    fn create_request_rejects_bad_cover_url() {
        let req = CreatePostRequest {
            title: "t".into(),
            content: "c".into(),
            category: "dining".into(),
            tags: None,
            cover_image: Some("not a url".into()),
            status: None,
        };
        let err = req.validate().unwrap_err();
        assert!(err.field_errors().contains_key("cover_image"));
    }
}
