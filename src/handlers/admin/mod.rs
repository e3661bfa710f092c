// src/handlers/admin/mod.rs

//! Moderation endpoints. Mounted behind `admin_middleware`; each handler still
//! takes an [`AdminActor`](crate::utils::jwt::AdminActor) to pass the acting admin on.

pub mod comments;
pub mod posts;
pub mod users;
