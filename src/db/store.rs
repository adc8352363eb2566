use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{NewRecommendation, Recommendation, ScoreFilter},
};

/// Persistence contract consumed by the recommendation service
///
/// Implementations own id assignment and the atomicity of single calls.
/// Sequences of calls made by the service are not transactional.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Inserts a new recommendation with a score of 0
    ///
    /// Returns `AppError::Conflict` if the store itself rejects a duplicate name.
    async fn create(&self, new: NewRecommendation) -> AppResult<Recommendation>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>>;

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>>;

    /// Atomically adds `delta` to the score and returns the new state
    ///
    /// Returns `AppError::NotFound` if the record no longer exists.
    async fn update_score(&self, id: i32, delta: i32) -> AppResult<Recommendation>;

    /// Deletes a recommendation; a missing id is a no-op
    async fn remove(&self, id: i32) -> AppResult<()>;

    /// Lists recommendations in id order, optionally restricted to one score pool
    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>>;

    /// Highest scores first, ties broken by ascending id
    async fn get_top_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>>;

    /// Deletes every recommendation
    async fn truncate(&self) -> AppResult<()>;
}
