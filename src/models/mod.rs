// src/models/mod.rs

pub mod batch;
pub mod category;
pub mod comment;
pub mod emotion;
pub mod pagination;
pub mod post;
pub mod role;
pub mod user;
