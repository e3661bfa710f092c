// src/models/category.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Closed set of post categories, persisted by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostCategory {
    Academic,
    CampusLife,
    ClubActivity,
    JobIntern,
    Secondhand,
    LostFound,
    Dormitory,
    Dining,
    StudyGroup,
    CourseReview,
    Scholarship,
    Competition,
    Volunteer,
    Sports,
    Entertainment,
    Travel,
    Emotional,
    Anonymous,
    Notice,
    Other,
}

impl PostCategory {
    pub const ALL: [PostCategory; 20] = [
        PostCategory::Academic,
        PostCategory::CampusLife,
        PostCategory::ClubActivity,
        PostCategory::JobIntern,
        PostCategory::Secondhand,
        PostCategory::LostFound,
        PostCategory::Dormitory,
        PostCategory::Dining,
        PostCategory::StudyGroup,
        PostCategory::CourseReview,
        PostCategory::Scholarship,
        PostCategory::Competition,
        PostCategory::Volunteer,
        PostCategory::Sports,
        PostCategory::Entertainment,
        PostCategory::Travel,
        PostCategory::Emotional,
        PostCategory::Anonymous,
        PostCategory::Notice,
        PostCategory::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PostCategory::Academic => "academic",
            PostCategory::CampusLife => "campus_life",
            PostCategory::ClubActivity => "club_activity",
            PostCategory::JobIntern => "job_intern",
            PostCategory::Secondhand => "secondhand",
            PostCategory::LostFound => "lost_found",
            PostCategory::Dormitory => "dormitory",
            PostCategory::Dining => "dining",
            PostCategory::StudyGroup => "study_group",
            PostCategory::CourseReview => "course_review",
            PostCategory::Scholarship => "scholarship",
            PostCategory::Competition => "competition",
            PostCategory::Volunteer => "volunteer",
            PostCategory::Sports => "sports",
            PostCategory::Entertainment => "entertainment",
            PostCategory::Travel => "travel",
            PostCategory::Emotional => "emotional",
            PostCategory::Anonymous => "anonymous",
            PostCategory::Notice => "notice",
            PostCategory::Other => "other",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PostCategory::Academic => "学术交流",
            PostCategory::CampusLife => "校园生活",
            PostCategory::ClubActivity => "社团活动",
            PostCategory::JobIntern => "求职实习",
            PostCategory::Secondhand => "二手交易",
            PostCategory::LostFound => "失物招领",
            PostCategory::Dormitory => "宿舍生活",
            PostCategory::Dining => "饮食推荐",
            PostCategory::StudyGroup => "学习小组",
            PostCategory::CourseReview => "课程评价",
            PostCategory::Scholarship => "奖学金",
            PostCategory::Competition => "竞赛信息",
            PostCategory::Volunteer => "志愿活动",
            PostCategory::Sports => "体育运动",
            PostCategory::Entertainment => "娱乐休闲",
            PostCategory::Travel => "旅游出行",
            PostCategory::Emotional => "情感交流",
            PostCategory::Anonymous => "匿名树洞",
            PostCategory::Notice => "通知公告",
            PostCategory::Other => "其他",
        }
    }

    /// Exact, case-sensitive code lookup.
    pub fn from_code(code: &str) -> Option<PostCategory> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn from_display_name(name: &str) -> Option<PostCategory> {
        Self::ALL.into_iter().find(|c| c.display_name() == name)
    }

    /// Request input may carry either the code or the display name.
    pub fn parse_input(input: &str) -> Result<PostCategory, AppError> {
        let input = input.trim();
        Self::from_code(input)
            .or_else(|| Self::from_display_name(input))
            .ok_or_else(|| {
                AppError::invalid_field("category", format!("Unknown post category: {}", input))
            })
    }
}

impl TryFrom<String> for PostCategory {
    type Error = AppError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code)
            .ok_or_else(|| AppError::invalid_field("category", format!("Unknown post category: {}", code)))
    }
}

/// `{code, displayName}` pair for category listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub code: &'static str,
    pub display_name: &'static str,
}

impl From<PostCategory> for CategoryView {
    fn from(c: PostCategory) -> Self {
        CategoryView {
            code: c.code(),
            display_name: c.display_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for c in PostCategory::ALL {
            assert!(seen.insert(c.code()));
            assert_eq!(PostCategory::from_code(c.code()), Some(c));
            assert_eq!(PostCategory::from_display_name(c.display_name()), Some(c));
            // serde and the code table agree
            assert_eq!(serde_json::to_value(c).unwrap(), c.code());
        }
    }

    #[test]
    fn code_lookup_is_case_sensitive() {
        assert_eq!(PostCategory::from_code("dining"), Some(PostCategory::Dining));
        assert_eq!(PostCategory::from_code("Dining"), None);
        assert_eq!(PostCategory::from_code("nope"), None);
    }

    #[test]
    fn input_accepts_code_or_display_name() {
        assert_eq!(PostCategory::parse_input("lost_found").unwrap(), PostCategory::LostFound);
        assert_eq!(PostCategory::parse_input(" 饮食推荐 ").unwrap(), PostCategory::Dining);
        assert!(matches!(
            PostCategory::parse_input("gossip"),
            Err(AppError::Validation { .. })
        ));
    }
}
