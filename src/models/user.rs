// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::role::UserRole;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Unique email.
    pub email: String,

    /// Argon2 password hash. Never rendered.
    pub password_hash: String,

    #[sqlx(try_from = "String")]
    pub role: UserRole,

    pub avatar_url: Option<String>,
    pub bio: Option<String>,

    /// Disabled accounts cannot authenticate (self-deleted or admin-disabled).
    pub enabled: bool,
    pub locked: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn can_authenticate(&self) -> bool {
        self.enabled && !self.locked
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller, resolved per request and passed explicitly
/// into every service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub role_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub enabled: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            role_name: user.role.display_name().to_string(),
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            avatar_url: user.avatar_url,
            bio: user.bio,
            enabled: user.enabled,
            locked: user.locked,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserView,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "Password length must be between 6 and 100 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
}

/// Blank avatar is allowed: it clears the field.
fn validate_avatar(url: &str) -> Result<(), validator::ValidationError> {
    if url.trim().is_empty() {
        return Ok(());
    }
    super::post::validate_url_string(url)
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Email must be a valid address."))]
    pub email: Option<String>,
    #[validate(
        length(max = 500, message = "Avatar URL must be at most 500 characters."),
        custom(function = validate_avatar)
    )]
    pub avatar_url: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters."))]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required."))]
    pub current_password: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "Password length must be between 6 and 100 characters."
    ))]
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Admin user listing filters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserFilterParams {
    pub enabled: Option<bool>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct UserQuery {
    pub enabled: Option<bool>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEnabledRequest {
    pub user_ids: Vec<i64>,
    pub enabled: bool,
}
