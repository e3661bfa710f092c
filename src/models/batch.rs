// src/models/batch.rs

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Applied,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: i64,
    pub outcome: ItemOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item result of a best-effort batch. Items are independent: a failure
/// is recorded here and the batch moves on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub requested: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchOutcome {
    pub fn applied(&mut self, id: i64) {
        self.push(id, ItemOutcome::Applied, None);
    }

    pub fn skipped(&mut self, id: i64, reason: impl Into<String>) {
        self.push(id, ItemOutcome::Skipped, Some(reason.into()));
    }

    pub fn failed(&mut self, id: i64, action: &str, err: &AppError) {
        tracing::warn!("Batch {} failed for id {}: {}", action, id, err);
        self.push(id, ItemOutcome::Failed, Some(err.to_string()));
    }

    fn push(&mut self, id: i64, outcome: ItemOutcome, error: Option<String>) {
        self.requested += 1;
        match outcome {
            ItemOutcome::Applied => self.succeeded += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
        self.items.push(BatchItem { id, outcome, error });
    }
}
