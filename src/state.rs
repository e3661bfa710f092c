use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::sentiment::SentimentAnalyzer;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub analyzer: Arc<dyn SentimentAnalyzer>,
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SentimentAnalyzer> {
    fn from_ref(state: &AppState) -> Self {
        state.analyzer.clone()
    }
}
