// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod comment;
pub mod emotion;
pub mod post;
pub mod user;
