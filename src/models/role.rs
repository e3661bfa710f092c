// src/models/role.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Moderator,
    Admin,
    Guest,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::User,
        UserRole::Moderator,
        UserRole::Admin,
        UserRole::Guest,
    ];

    pub fn code(self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Moderator => "MODERATOR",
            UserRole::Admin => "ADMIN",
            UserRole::Guest => "GUEST",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UserRole::User => "普通用户",
            UserRole::Moderator => "审核员",
            UserRole::Admin => "管理员",
            UserRole::Guest => "游客",
        }
    }

    /// Case-insensitive. Unknown codes are an error, never a default role.
    pub fn from_code(code: &str) -> Result<UserRole, AppError> {
        let upper = code.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|r| r.code() == upper)
            .ok_or_else(|| AppError::invalid_field("role", format!("Unknown user role: {}", code)))
    }

    pub fn is_admin(self) -> bool {
        self == UserRole::Admin
    }
}

impl TryFrom<String> for UserRole {
    type Error = AppError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code)
    }
}
