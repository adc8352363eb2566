use std::sync::Arc;

use crate::db::{MemoryRecommendationStore, RecommendationStore};
use crate::services::{RandomSource, RecommendationService, ThreadRandom};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    /// Wraps an already configured service
    pub fn new(recommendations: RecommendationService) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
        }
    }

    /// Builds the service over `store` with the thread-local random source
    pub fn with_store(store: Arc<dyn RecommendationStore>) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(ThreadRandom);
        Self::new(RecommendationService::new(store, random))
    }

    /// Creates a state backed by an empty in-memory store
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryRecommendationStore::new()))
    }
}
