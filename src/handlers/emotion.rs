// src/handlers/emotion.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError, models::user::Actor, sentiment::SentimentAnalyzer, services::emotion,
    store::Store,
};

/// Cached sentiment of a post, computed on first request.
pub async fn analyze_post(
    State(store): State<Arc<dyn Store>>,
    State(analyzer): State<Arc<dyn SentimentAnalyzer>>,
    _actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        emotion::analyze_post(store.as_ref(), analyzer.as_ref(), id).await?,
    ))
}

pub async fn analyze_comment(
    State(store): State<Arc<dyn Store>>,
    State(analyzer): State<Arc<dyn SentimentAnalyzer>>,
    _actor: Actor,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        emotion::analyze_comment(store.as_ref(), analyzer.as_ref(), id).await?,
    ))
}
