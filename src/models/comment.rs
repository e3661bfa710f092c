// src/models/comment.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::pagination::Direction;
use super::post::summarize;
use super::user::Actor;

pub const DELETED_PLACEHOLDER: &str = "[此评论已被删除]";
pub const HIDDEN_PLACEHOLDER: &str = "[此评论已被隐藏]";
pub const PARENT_PREVIEW_CHARS: usize = 50;
pub const REPLY_PREVIEW_COUNT: usize = 3;

/// Represents a row in 'comments' joined with its author, post and parent.
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    /// None for top-level comments.
    pub parent_comment_id: Option<i64>,

    pub is_deleted: bool,
    pub is_active: bool,
    pub delete_reason: Option<String>,
    pub deleted_by: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Joined, absent when the referenced row is gone.
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    pub post_title: Option<String>,
    pub parent_content: Option<String>,
    pub parent_is_deleted: Option<bool>,
    pub parent_is_active: Option<bool>,

    /// Non-deleted direct replies.
    pub reply_count: i64,
}

impl Comment {
    pub fn is_visible(&self) -> bool {
        !self.is_deleted && self.is_active
    }

    pub fn display_content(&self) -> String {
        if self.is_deleted {
            DELETED_PLACEHOLDER.to_string()
        } else if !self.is_active {
            HIDDEN_PLACEHOLDER.to_string()
        } else {
            self.content.clone()
        }
    }

    pub fn is_edited(&self) -> bool {
        self.updated_at - self.created_at > Duration::minutes(1)
    }

    fn parent_preview(&self) -> Option<String> {
        self.parent_comment_id?;
        let content = self.parent_content.as_deref()?;
        if self.parent_is_deleted.unwrap_or(false) {
            Some(DELETED_PLACEHOLDER.to_string())
        } else if !self.parent_is_active.unwrap_or(true) {
            Some(HIDDEN_PLACEHOLDER.to_string())
        } else {
            Some(summarize(content, PARENT_PREVIEW_CHARS))
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// How a soft delete treats the post's comment counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterPolicy {
    Decrement,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentFilter {
    #[default]
    Any,
    TopLevel,
    RepliesTo(i64),
}

#[derive(Debug, Clone)]
pub struct CommentQuery {
    pub post_id: Option<i64>,
    pub user_id: Option<i64>,
    pub parent: ParentFilter,
    pub deleted: Option<bool>,
    pub active: Option<bool>,
    /// Ordered by created_at, id as tie-break.
    pub order: Direction,
}

impl Default for CommentQuery {
    fn default() -> Self {
        CommentQuery {
            post_id: None,
            user_id: None,
            parent: ParentFilter::Any,
            deleted: None,
            active: None,
            order: Direction::Desc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub post_title: Option<String>,
    pub user_id: i64,
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    pub parent_comment_id: Option<i64>,
    pub parent_preview: Option<String>,
    pub is_top_level: bool,
    pub is_reply: bool,
    pub is_deleted: bool,
    pub is_active: bool,
    pub is_edited: bool,
    pub can_edit: bool,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentView>>,

    // Moderation fields, admin renderings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CommentView {
    /// Public rendering: deleted or hidden text is replaced by a placeholder.
    pub fn render(comment: Comment, viewer: Option<&Actor>) -> Self {
        let can_edit = viewer.is_some_and(|a| a.id == comment.user_id) && !comment.is_deleted;
        let content = comment.display_content();
        Self::build(comment, content, can_edit, false)
    }

    /// Admin rendering: raw stored text plus moderation fields.
    pub fn render_admin(comment: Comment) -> Self {
        let content = comment.content.clone();
        Self::build(comment, content, false, true)
    }

    pub fn with_replies(mut self, replies: Vec<CommentView>) -> Self {
        self.replies = Some(replies);
        self
    }

    fn build(comment: Comment, content: String, can_edit: bool, moderation: bool) -> Self {
        let parent_preview = comment.parent_preview();
        let is_edited = comment.is_edited();
        CommentView {
            id: comment.id,
            content,
            post_id: comment.post_id,
            post_title: comment.post_title,
            user_id: comment.user_id,
            username: comment.username,
            user_avatar: comment.user_avatar,
            parent_comment_id: comment.parent_comment_id,
            parent_preview,
            is_top_level: comment.parent_comment_id.is_none(),
            is_reply: comment.parent_comment_id.is_some(),
            is_deleted: comment.is_deleted,
            is_active: comment.is_active,
            is_edited,
            can_edit,
            reply_count: comment.reply_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            replies: None,
            delete_reason: if moderation { comment.delete_reason } else { None },
            deleted_by: if moderation { comment.deleted_by } else { None },
            deleted_at: if moderation { comment.deleted_at } else { None },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: i64,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Content length must be between 1 and 2000 chars"
    ))]
    pub content: String,
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Content length must be between 1 and 2000 chars"
    ))]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ModerationReason {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetActiveRequest {
    pub active: bool,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCommentRequest {
    pub comment_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilterParams {
    pub is_deleted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment() -> Comment {
        let now = Utc::now();
        Comment {
            id: 7,
            content: "original text".into(),
            user_id: 1,
            post_id: 2,
            parent_comment_id: None,
            is_deleted: false,
            is_active: true,
            delete_reason: None,
            deleted_by: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            username: Some("alice".into()),
            user_avatar: None,
            post_title: Some("title".into()),
            parent_content: None,
            parent_is_deleted: None,
            parent_is_active: None,
            reply_count: 0,
        }
    }

    fn actor(id: i64) -> Actor {
        Actor {
            id,
            username: format!("u{}", id),
            role: super::super::role::UserRole::User,
        }
    }

    #[test]
    fn placeholders_hide_stored_text() {
        let mut c = comment();
        c.is_active = false;
        assert_eq!(CommentView::render(c.clone(), None).content, HIDDEN_PLACEHOLDER);

        c.is_deleted = true;
        let view = CommentView::render(c.clone(), Some(&actor(1)));
        assert_eq!(view.content, DELETED_PLACEHOLDER);
        assert!(!view.can_edit);

        let admin = CommentView::render_admin(c);
        assert_eq!(admin.content, "original text");
        assert!(!admin.can_edit);
    }

    #[test]
    fn edited_after_one_minute() {
        let mut c = comment();
        c.updated_at = c.created_at + Duration::seconds(30);
        assert!(!c.is_edited());
        c.updated_at = c.created_at + Duration::seconds(61);
        assert!(c.is_edited());
    }

    #[test]
    fn parent_preview_rules() {
        let mut c = comment();
        c.parent_comment_id = Some(3);
        // parent row gone
        assert_eq!(CommentView::render(c.clone(), None).parent_preview, None);

        c.parent_content = Some("p".repeat(80));
        c.parent_is_deleted = Some(false);
        c.parent_is_active = Some(true);
        let preview = CommentView::render(c.clone(), None).parent_preview.unwrap();
        assert_eq!(preview, format!("{}...", "p".repeat(50)));

        c.parent_is_deleted = Some(true);
        assert_eq!(
            CommentView::render(c, None).parent_preview.as_deref(),
            Some(DELETED_PLACEHOLDER)
        );
    }

    #[test]
    fn only_owner_can_edit() {
        let view = CommentView::render(comment(), Some(&actor(1)));
        assert!(view.can_edit && view.is_top_level && !view.is_reply);
        assert!(!CommentView::render(comment(), Some(&actor(2))).can_edit);
        assert!(!CommentView::render(comment(), None).can_edit);
    }
}
