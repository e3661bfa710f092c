// src/services/access.rs

//! The single access-control gate checked before every mutation.

use crate::error::AppError;
use crate::models::user::Actor;

/// Self-service mutations: the actor must own the resource.
pub fn require_owner(actor: &Actor, owner_id: i64, message: &str) -> Result<(), AppError> {
    if actor.id != owner_id {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

/// Moderation surface: the actor must be an ADMIN.
pub fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if !actor.is_admin() {
        return Err(AppError::Forbidden("Administrator role required".to_string()));
    }
    Ok(())
}

/// Account-level moderation may never target the acting admin.
pub fn require_not_self(actor: &Actor, target_id: i64, message: &str) -> Result<(), AppError> {
    if actor.id == target_id {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::UserRole;

    fn actor(id: i64, role: UserRole) -> Actor {
        Actor {
            id,
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn owner_check() {
        let a = actor(1, UserRole::User);
        assert!(require_owner(&a, 1, "nope").is_ok());
        assert_eq!(
            require_owner(&a, 2, "nope"),
            Err(AppError::Forbidden("nope".into()))
        );
        // admins get no bypass on self-service paths
        assert!(require_owner(&actor(1, UserRole::Admin), 2, "nope").is_err());
    }

    #[test]
    fn admin_check() {
        assert!(require_admin(&actor(1, UserRole::Admin)).is_ok());
        for role in [UserRole::User, UserRole::Moderator, UserRole::Guest] {
            assert!(matches!(
                require_admin(&actor(1, role)),
                Err(AppError::Forbidden(_))
            ));
        }
    }

    #[test]
    fn self_targeting_is_forbidden_even_for_admins() {
        let admin = actor(5, UserRole::Admin);
        assert!(require_not_self(&admin, 6, "x").is_ok());
        assert!(matches!(
            require_not_self(&admin, 5, "x"),
            Err(AppError::Forbidden(_))
        ));
    }
}
