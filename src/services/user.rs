// src/services/user.rs

use chrono::Utc;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    emotion::EmotionStats,
    role::UserRole,
    user::{
        Actor, AuthResponse, ChangePasswordRequest, LoginRequest, NewUser, RegisterRequest,
        UpdateProfileRequest, User, UserView,
    },
};
use crate::store::Store;
use crate::utils::{
    hash::{hash_password, verify_password},
    html::clean_optional,
    jwt::sign_jwt,
};

async fn load(store: &dyn Store, id: i64) -> Result<User, AppError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

/// Creates a USER account. Duplicate username or email is a Conflict.
pub async fn register(store: &dyn Store, req: RegisterRequest) -> Result<UserView, AppError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if store.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists!".to_string()));
    }
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists!".to_string()));
    }

    let user = store
        .insert_user(NewUser {
            username,
            email,
            password_hash: hash_password(&req.password)?,
            role: UserRole::User,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.id, user.username);
    Ok(UserView::from(user))
}

/// Verifies credentials and issues a Bearer token.
pub async fn login(
    store: &dyn Store,
    config: &Config,
    req: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let invalid = || AppError::AuthError("Invalid username or password".to_string());

    let user = store
        .find_user_by_username(req.username.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&req.password, &user.password_hash)? {
        return Err(invalid());
    }
    if !user.enabled {
        return Err(AppError::AuthError("Account is disabled".to_string()));
    }
    if user.locked {
        return Err(AppError::AuthError("Account is locked".to_string()));
    }

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    Ok(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: config.jwt_expiration,
        user: UserView::from(user),
    })
}

pub async fn profile(store: &dyn Store, actor: &Actor) -> Result<UserView, AppError> {
    Ok(UserView::from(load(store, actor.id).await?))
}

/// Absent fields are kept; a blank avatar or bio clears it.
pub async fn update_profile(
    store: &dyn Store,
    actor: &Actor,
    req: UpdateProfileRequest,
) -> Result<UserView, AppError> {
    let mut user = load(store, actor.id).await?;

    if let Some(email) = req.email.as_deref().map(str::trim) {
        if email != user.email {
            if store.find_user_by_email(email).await?.is_some() {
                return Err(AppError::Conflict("Email already exists!".to_string()));
            }
            user.email = email.to_string();
        }
    }
    if let Some(avatar) = req.avatar_url.as_deref() {
        let avatar = avatar.trim();
        user.avatar_url = (!avatar.is_empty()).then(|| avatar.to_string());
    }
    if let Some(bio) = req.bio.as_deref() {
        user.bio = clean_optional(Some(bio));
    }
    user.updated_at = Utc::now();

    store.update_user_profile(&user).await?;
    tracing::info!("User {} updated profile", user.id);
    Ok(UserView::from(user))
}

pub async fn change_password(
    store: &dyn Store,
    actor: &Actor,
    req: ChangePasswordRequest,
) -> Result<(), AppError> {
    if req.new_password != req.confirm_password {
        return Err(AppError::invalid_field(
            "confirmPassword",
            "New password and confirmation do not match",
        ));
    }
    let user = load(store, actor.id).await?;
    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::Conflict("Current password is incorrect".to_string()));
    }
    if req.new_password == req.current_password {
        return Err(AppError::invalid_field(
            "newPassword",
            "New password must differ from the current password",
        ));
    }

    store
        .update_user_password(user.id, &hash_password(&req.new_password)?, Utc::now())
        .await?;
    tracing::info!("User {} changed password", user.id);
    Ok(())
}

/// Self-service account removal disables the account; its content stays.
pub async fn delete_account(store: &dyn Store, actor: &Actor, password: &str) -> Result<(), AppError> {
    let user = load(store, actor.id).await?;
    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Conflict("Password is incorrect".to_string()));
    }
    store.set_user_enabled(user.id, false, Utc::now()).await?;
    tracing::info!("User {} disabled own account", user.id);
    Ok(())
}

/// Label counts over the user's analyzed posts and comments.
pub async fn emotion_stats(store: &dyn Store, user_id: i64) -> Result<EmotionStats, AppError> {
    load(store, user_id).await?;
    let (posts, comments) = store.user_sentiments(user_id).await?;
    Ok(EmotionStats::tally(user_id, &posts, &comments))
}

/// Creates the configured administrator unless the username is taken.
pub async fn seed_admin(store: &dyn Store, config: &Config) -> Result<(), AppError> {
    let (Some(username), Some(password), Some(email)) = (
        config.admin_username.as_deref(),
        config.admin_password.as_deref(),
        config.admin_email.as_deref(),
    ) else {
        tracing::debug!("No administrator configured, skipping seed");
        return Ok(());
    };

    if store.find_user_by_username(username).await?.is_some() {
        tracing::info!("Administrator '{}' already present", username);
        return Ok(());
    }

    let admin = store
        .insert_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role: UserRole::Admin,
            created_at: Utc::now(),
        })
        .await?;
    tracing::info!("Seeded administrator '{}' (id {})", admin.username, admin.id);
    Ok(())
}
