use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation, ScoreFilter},
};

/// In-process store backed by an ordered map
///
/// Used for local runs without PostgreSQL and by the HTTP tests.
/// Ids come from a counter that only grows, so removed ids never return.
#[derive(Default)]
pub struct MemoryRecommendationStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    last_id: i32,
    records: BTreeMap<i32, Recommendation>,
}

impl MemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecommendationStore for MemoryRecommendationStore {
    async fn create(&self, new: NewRecommendation) -> AppResult<Recommendation> {
        let mut inner = self.inner.write().await;

        if inner.records.values().any(|r| r.name == new.name) {
            return Err(AppError::Conflict(
                "Recommendations names must be unique".to_string(),
            ));
        }

        inner.last_id += 1;
        let recommendation = Recommendation {
            id: inner.last_id,
            name: new.name,
            link: new.link,
            score: 0,
        };
        inner
            .records
            .insert(recommendation.id, recommendation.clone());

        Ok(recommendation)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>> {
        let inner = self.inner.read().await;
        Ok(inner.records.values().find(|r| r.name == name).cloned())
    }

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).cloned())
    }

    async fn update_score(&self, id: i32, delta: i32) -> AppResult<Recommendation> {
        let mut inner = self.inner.write().await;
        let recommendation = inner.records.get_mut(&id).ok_or_else(AppError::not_found)?;
        recommendation.score += delta;
        Ok(recommendation.clone())
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        self.inner.write().await.records.remove(&id);
        Ok(())
    }

    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .filter(|r| filter.map_or(true, |f| f.matches(r.score)))
            .cloned()
            .collect())
    }

    async fn get_top_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        let limit = usize::try_from(amount)
            .map_err(|_| AppError::Internal(format!("invalid amount: {}", amount)))?;

        let inner = self.inner.read().await;
        let mut ranked: Vec<Recommendation> = inner.records.values().cloned().collect();
        // Stable sort keeps id order among equal scores
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(limit);

        Ok(ranked)
    }

    async fn truncate(&self) -> AppResult<()> {
        self.inner.write().await.records.clear();
        Ok(())
    }
}
