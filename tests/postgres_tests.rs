// tests/postgres_tests.rs

//! Exercises `PgStore` against a real database. Skipped unless DATABASE_URL is set.

use chrono::Utc;
use campus_wall::{
    models::{
        category::PostCategory,
        comment::{CommentQuery, CounterPolicy, NewComment},
        pagination::{Direction, PageRequest},
        post::{NewPost, PostStatus},
        role::UserRole,
        user::NewUser,
    },
    store::{PgStore, Store},
    utils::slug::generate_unique_slug,
};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> Option<PgStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

#[tokio::test]
async fn comment_counter_and_post_cascade() {
    let Some(store) = connect().await else {
        return;
    };

    let name = format!("pg_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let user = store
        .insert_user(NewUser {
            username: name.clone(),
            email: format!("{}@campus.test", name),
            password_hash: "not-a-real-hash".to_string(),
            role: UserRole::User,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let now = Utc::now();
    let post = store
        .insert_post(NewPost {
            title: "数据库测试".to_string(),
            content: "body".to_string(),
            slug: generate_unique_slug("数据库测试"),
            author_id: user.id,
            status: PostStatus::Published,
            category: PostCategory::StudyGroup,
            tags: None,
            cover_image: None,
            created_at: now,
            published_at: Some(now),
        })
        .await
        .unwrap();

    let comment = |parent: Option<i64>, text: &str| NewComment {
        content: text.to_string(),
        user_id: user.id,
        post_id: post.id,
        parent_comment_id: parent,
        created_at: Utc::now(),
    };
    let root = store.insert_comment(comment(None, "root")).await.unwrap();
    let reply = store.insert_comment(comment(Some(root), "reply")).await.unwrap();
    let extra = store.insert_comment(comment(None, "extra")).await.unwrap();

    let counted = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(counted.comment_count, 3);

    let joined = store.find_comment(reply).await.unwrap().unwrap();
    assert_eq!(joined.parent_content.as_deref(), Some("root"));
    assert_eq!(joined.username.as_deref(), Some(name.as_str()));
    assert_eq!(store.find_comment(root).await.unwrap().unwrap().reply_count, 1);

    // self-service path decrements, moderation path keeps
    assert!(
        store
            .soft_delete_comment(extra, user.id, None, CounterPolicy::Decrement, Utc::now())
            .await
            .unwrap()
    );
    assert!(
        !store
            .soft_delete_comment(extra, user.id, None, CounterPolicy::Decrement, Utc::now())
            .await
            .unwrap()
    );
    assert!(
        store
            .soft_delete_comment(reply, user.id, Some("spam"), CounterPolicy::Keep, Utc::now())
            .await
            .unwrap()
    );
    assert_eq!(store.find_post(post.id).await.unwrap().unwrap().comment_count, 2);

    assert!(store.set_comment_active(reply, false, Some("review")).await.unwrap());
    let hidden = store.find_comment(reply).await.unwrap().unwrap();
    assert!(!hidden.is_active);
    assert_eq!(hidden.delete_reason.as_deref(), Some("spam"));

    let query = CommentQuery {
        post_id: Some(post.id),
        deleted: Some(false),
        ..Default::default()
    };
    let live = store
        .list_comments(&query, &PageRequest::new(0, 10, Direction::Asc))
        .await
        .unwrap();
    assert_eq!(live.total, 1);

    let cascaded = store
        .delete_post_cascade(post.id, user.id, "cleanup", Utc::now())
        .await
        .unwrap();
    assert_eq!(cascaded, Some(1));
    assert!(store.find_post(post.id).await.unwrap().is_none());
    let orphan = store.find_comment(root).await.unwrap().unwrap();
    assert!(orphan.is_deleted);
    assert_eq!(orphan.delete_reason.as_deref(), Some("cleanup"));

    assert!(store.delete_user(user.id).await.unwrap());
}
