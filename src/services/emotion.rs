// src/services/emotion.rs

//! Sentiment lookup-or-create. A cached result is returned as-is; a miss calls
//! the analyzer and stores the answer. Analyzer failures are never cached.

use chrono::Utc;

use crate::error::AppError;
use crate::models::emotion::{EmotionTarget, EmotionView, NewEmotion};
use crate::sentiment::SentimentAnalyzer;
use crate::store::Store;

async fn analyze_target(
    store: &dyn Store,
    analyzer: &dyn SentimentAnalyzer,
    target: EmotionTarget,
    text: String,
) -> Result<EmotionView, AppError> {
    if let Some(cached) = store.find_emotion(target).await? {
        return Ok(cached.into());
    }

    let sentiment = analyzer.analyze(&text).await?;
    tracing::info!(
        "Analyzed {:?}: {} ({:.2})",
        target,
        sentiment.label,
        sentiment.confidence
    );

    let row = store
        .insert_emotion(NewEmotion {
            target,
            text,
            sentiment: sentiment.label,
            confidence: sentiment.confidence,
            probabilities: sentiment.probabilities,
            created_at: Utc::now(),
        })
        .await?;
    Ok(row.into())
}

pub async fn analyze_post(
    store: &dyn Store,
    analyzer: &dyn SentimentAnalyzer,
    post_id: i64,
) -> Result<EmotionView, AppError> {
    let post = super::post::load(store, post_id).await?;
    analyze_target(store, analyzer, EmotionTarget::Post(post.id), post.content).await
}

/// Deleted or hidden comments are treated as missing.
pub async fn analyze_comment(
    store: &dyn Store,
    analyzer: &dyn SentimentAnalyzer,
    comment_id: i64,
) -> Result<EmotionView, AppError> {
    let comment = store
        .find_comment(comment_id)
        .await?
        .filter(|c| c.is_visible())
        .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
    analyze_target(store, analyzer, EmotionTarget::Comment(comment.id), comment.content).await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::comment::CreateCommentRequest;
    use crate::models::post::PostStatus;
    use crate::models::role::UserRole;
    use crate::sentiment::Sentiment;
    use crate::services::comment;
    use crate::services::test_support::{seed_post, seed_user};
    use crate::services::user::emotion_stats;
    use crate::store::MemoryStore;

    /// Answers "positive" and counts calls.
    #[derive(Default)]
    struct StubAnalyzer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SentimentAnalyzer for StubAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<Sentiment, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Sentiment {
                label: "positive".into(),
                confidence: 0.9,
                probabilities: BTreeMap::from([("positive".into(), 0.9), ("negative".into(), 0.1)]),
            })
        }
    }

    struct DownAnalyzer;

    #[async_trait]
    impl SentimentAnalyzer for DownAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<Sentiment, AppError> {
            Err(AppError::Upstream("Sentiment analyzer unreachable".into()))
        }
    }

    #[tokio::test]
    async fn second_lookup_hits_cache() {
        let store = MemoryStore::new();
        let analyzer = StubAnalyzer::default();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;

        let first = analyze_post(&store, &analyzer, post.id).await.unwrap();
        let second = analyze_post(&store, &analyzer, post.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.post_id, Some(post.id));
        assert_eq!(first.text, post.content);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);

        let stats = emotion_stats(&store, alice.id).await.unwrap();
        assert_eq!(stats.posts.get("positive"), Some(&1));
        assert_eq!(stats.total.get("positive"), Some(&1));
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;

        let err = analyze_post(&store, &DownAnalyzer, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(store.find_emotion(EmotionTarget::Post(post.id)).await.unwrap().is_none());

        let analyzer = StubAnalyzer::default();
        analyze_post(&store, &analyzer, post.id).await.unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn comments_must_exist_and_be_live() {
        let store = MemoryStore::new();
        let analyzer = StubAnalyzer::default();
        let alice = seed_user(&store, "alice", UserRole::User).await;
        let post = seed_post(&store, &alice, PostStatus::Published).await;
        let c = comment::create(
            &store,
            &alice,
            CreateCommentRequest {
                post_id: post.id,
                content: "不错".into(),
                parent_comment_id: None,
            },
        )
        .await
        .unwrap();

        let view = analyze_comment(&store, &analyzer, c.id).await.unwrap();
        assert_eq!(view.comment_id, Some(c.id));
        assert_eq!(view.post_id, None);

        comment::delete(&store, &alice, c.id).await.unwrap();
        let err = analyze_comment(&store, &analyzer, c.id).await.unwrap_err();
        assert_eq!(err, AppError::not_found("Comment", c.id));
        assert_eq!(
            analyze_post(&store, &analyzer, 999).await.unwrap_err(),
            AppError::not_found("Post", 999)
        );
    }
}
