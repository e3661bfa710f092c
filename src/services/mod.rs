// src/services/mod.rs

//! Core operations. Every mutating call takes the acting [`Actor`] explicitly.
//!
//! [`Actor`]: crate::models::user::Actor

pub mod access;
pub mod admin_comment;
pub mod admin_post;
pub mod admin_user;
pub mod comment;
pub mod emotion;
pub mod post;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::models::{
        category::PostCategory,
        post::{NewPost, Post, PostStatus},
        role::UserRole,
        user::{Actor, NewUser},
    };
    use crate::store::{MemoryStore, Store};
    use crate::utils::slug::generate_unique_slug;

    pub async fn seed_user(store: &MemoryStore, name: &str, role: UserRole) -> Actor {
        let user = store
            .insert_user(NewUser {
                username: name.to_string(),
                email: format!("{}@campus.test", name),
                password_hash: crate::utils::hash::hash_password("password123").unwrap(),
                role,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        Actor::from(&user)
    }

    pub async fn seed_post(store: &MemoryStore, author: &Actor, status: PostStatus) -> Post {
        let now = Utc::now();
        store
            .insert_post(NewPost {
                title: "食堂推荐".to_string(),
                content: "二食堂的麻辣烫很好吃".to_string(),
                slug: generate_unique_slug("食堂推荐"),
                author_id: author.id,
                status,
                category: PostCategory::Dining,
                tags: None,
                cover_image: None,
                created_at: now,
                published_at: (status == PostStatus::Published).then_some(now),
            })
            .await
            .unwrap()
    }
}
