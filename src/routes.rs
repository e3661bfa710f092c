// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    handlers::{self, admin},
    models::{
        category::PostCategory,
        post::{PostStatus, PostSummary, PostView},
        role::UserRole,
        user::UserView,
    },
    state::AppState,
    utils::jwt::{admin_middleware, identify_middleware},
};

/// Schema document served at `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "campus-wall", description = "Campus bulletin wall API"),
    components(schemas(PostView, PostSummary, PostStatus, PostCategory, UserView, UserRole))
)]
pub struct ApiDoc;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, posts, comments, emotion, admin).
/// * Applies global middleware (identify, Trace, CORS).
/// * Injects global state (store, config, analyzer).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/whoami", get(handlers::auth::whoami));

    let user_routes = Router::new()
        .route(
            "/me",
            get(handlers::user::get_me)
                .put(handlers::user::update_me)
                .delete(handlers::user::delete_me),
        )
        .route("/me/password", put(handlers::user::change_password))
        .route("/{id}/emotions", get(handlers::user::emotion_stats))
        .route("/{id}/comments", get(handlers::user::list_comments));

    let post_routes = Router::new()
        .route("/", post(handlers::post::create_post))
        .route("/feed", get(handlers::post::feed))
        .route("/me", get(handlers::post::list_my_posts))
        .route("/search", get(handlers::post::search))
        .route("/top", get(handlers::post::list_top))
        .route("/recommended", get(handlers::post::list_recommended))
        .route("/categories", get(handlers::post::list_categories))
        .route("/categories/stats", get(handlers::post::category_stats))
        .route("/category/{code}", get(handlers::post::list_by_category))
        .route("/slug/{slug}", get(handlers::post::get_post_by_slug))
        .route(
            "/{id}",
            get(handlers::post::get_post)
                .put(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
        .route("/{id}/publish", put(handlers::post::publish_post));

    let comment_routes = Router::new()
        .route("/", post(handlers::comment::create_comment))
        .route("/me", get(handlers::comment::list_my_comments))
        .route("/post/{post_id}", get(handlers::comment::list_for_post))
        .route("/post/{post_id}/toplevel", get(handlers::comment::list_top_level))
        .route(
            "/{id}",
            get(handlers::comment::get_comment)
                .put(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        .route("/{id}/replies", get(handlers::comment::list_replies));

    let emotion_routes = Router::new()
        .route("/post/{id}", get(handlers::emotion::analyze_post))
        .route("/comment/{id}", get(handlers::emotion::analyze_comment));

    let admin_post_routes = Router::new()
        .route("/", get(admin::posts::list_posts))
        .route("/review", get(admin::posts::review_queue))
        .route("/categories", get(admin::posts::list_categories))
        .route("/categories/stats", get(admin::posts::category_stats))
        .route("/statuses", get(admin::posts::list_statuses))
        .route("/batch/status", put(admin::posts::batch_status))
        .route(
            "/{id}",
            get(admin::posts::get_post).delete(admin::posts::delete_post),
        )
        .route("/{id}/status", put(admin::posts::set_status))
        .route("/{id}/top", put(admin::posts::set_top))
        .route("/{id}/recommended", put(admin::posts::set_recommended))
        .route("/{id}/action", post(admin::posts::perform_action));

    let admin_comment_routes = Router::new()
        .route("/", get(admin::comments::list_comments))
        .route("/deleted/{is_deleted}", get(admin::comments::list_by_deleted))
        .route("/user/{user_id}", get(admin::comments::list_by_user))
        .route("/post/{post_id}", get(admin::comments::list_by_post))
        .route("/batch/delete", post(admin::comments::batch_soft_delete))
        .route("/batch/hard-delete", post(admin::comments::batch_hard_delete))
        .route(
            "/{id}",
            get(admin::comments::get_comment).delete(admin::comments::soft_delete),
        )
        .route("/{id}/active", put(admin::comments::set_active))
        .route(
            "/{id}/hard",
            axum::routing::delete(admin::comments::hard_delete),
        );

    let admin_user_routes = Router::new()
        .route("/", get(admin::users::list_users))
        .route("/batch/enabled", put(admin::users::batch_set_enabled))
        .route(
            "/{id}",
            get(admin::users::get_user).delete(admin::users::delete_user),
        )
        .route("/{id}/enabled", put(admin::users::set_enabled));

    let admin_routes = Router::new()
        .nest("/posts", admin_post_routes)
        .nest("/comments", admin_comment_routes)
        .nest("/users", admin_user_routes)
        .layer(middleware::from_fn(admin_middleware));

    Router::new()
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/emotion", emotion_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(state.clone(), identify_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
