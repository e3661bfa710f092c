// src/sentiment.rs

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Classification returned by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    pub label: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

/// External sentiment classifier. Failures surface as `AppError::Upstream`.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Sentiment, AppError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    success: bool,
    sentiment: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    probabilities: BTreeMap<String, f64>,
    error: Option<String>,
}

impl AnalyzeResponse {
    fn into_sentiment(self) -> Result<Sentiment, AppError> {
        if !self.success {
            return Err(AppError::Upstream(format!(
                "Sentiment analysis failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )));
        }
        match (self.sentiment, self.confidence) {
            (Some(label), Some(confidence)) => Ok(Sentiment {
                label,
                confidence,
                probabilities: self.probabilities,
            }),
            _ => Err(AppError::Upstream(
                "Sentiment analyzer returned an incomplete result".to_string(),
            )),
        }
    }
}

/// Posts `{"text": ...}` to the configured endpoint. No retries.
pub struct HttpSentimentAnalyzer {
    client: reqwest::Client,
    url: String,
}

impl HttpSentimentAnalyzer {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SentimentAnalyzer for HttpSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Sentiment, AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Sentiment analyzer unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Sentiment analyzer responded with HTTP {}",
                status.as_u16()
            )));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed sentiment response: {}", e)))?;

        body.into_sentiment()
    }
}
