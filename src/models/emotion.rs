// src/models/emotion.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, types::Json};

/// What a cached sentiment belongs to. Exactly one per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionTarget {
    Post(i64),
    Comment(i64),
}

/// Represents the 'emotions' table. Immutable once written.
#[derive(Debug, Clone, FromRow)]
pub struct Emotion {
    pub id: i64,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub text: String,
    pub sentiment: String,
    pub confidence: f64,
    pub probabilities: Json<BTreeMap<String, f64>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmotion {
    pub target: EmotionTarget,
    pub text: String,
    pub sentiment: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionView {
    pub id: i64,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub text: String,
    pub sentiment: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl From<Emotion> for EmotionView {
    fn from(e: Emotion) -> Self {
        EmotionView {
            id: e.id,
            post_id: e.post_id,
            comment_id: e.comment_id,
            text: e.text,
            sentiment: e.sentiment,
            confidence: e.confidence,
            probabilities: e.probabilities.0,
            created_at: e.created_at,
        }
    }
}

/// Sentiment label counts over one user's cached posts and comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionStats {
    pub user_id: i64,
    pub posts: BTreeMap<String, i64>,
    pub comments: BTreeMap<String, i64>,
    pub total: BTreeMap<String, i64>,
}

impl EmotionStats {
    pub fn tally(user_id: i64, post_labels: &[String], comment_labels: &[String]) -> Self {
        let mut stats = EmotionStats {
            user_id,
            ..Default::default()
        };
        for label in post_labels {
            *stats.posts.entry(label.clone()).or_default() += 1;
            *stats.total.entry(label.clone()).or_default() += 1;
        }
        for label in comment_labels {
            *stats.comments.entry(label.clone()).or_default() += 1;
            *stats.total.entry(label.clone()).or_default() += 1;
        }
        stats
    }
}
