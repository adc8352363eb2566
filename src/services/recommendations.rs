use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation, ScoreFilter, VoteOutcome},
    services::random::RandomSource,
};

/// A downvote that leaves the score strictly below this deletes the record
pub const DELETE_THRESHOLD: i32 = -5;

/// Probability of drawing from the high-score pool
pub const HIGH_SCORE_PROBABILITY: f64 = 0.7;

/// Picks the score pool for a uniform draw in [0, 1)
pub fn get_score_filter(random_value: f64) -> ScoreFilter {
    if random_value < HIGH_SCORE_PROBABILITY {
        ScoreFilter::Gt
    } else {
        ScoreFilter::Lte
    }
}

/// Voting and selection rules over a recommendation store
///
/// Holds no state of its own. Every operation is a short sequence of store
/// calls; the look-up-then-mutate sequences are not transactional, so two
/// concurrent votes on one record may lose an update.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn RecommendationStore>,
    random: Arc<dyn RandomSource>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn RecommendationStore>, random: Arc<dyn RandomSource>) -> Self {
        Self { store, random }
    }

    /// Creates a recommendation with a score of 0
    ///
    /// Fails with `Conflict` when the name is already taken; nothing is written then.
    #[instrument(skip(self, candidate), fields(name = %candidate.name))]
    pub async fn insert(&self, candidate: NewRecommendation) -> AppResult<Recommendation> {
        if self.store.find_by_name(&candidate.name).await?.is_some() {
            return Err(AppError::Conflict(
                "Recommendations names must be unique".to_string(),
            ));
        }

        let recommendation = self.store.create(candidate).await?;
        tracing::debug!(recommendation_id = recommendation.id, "Recommendation created");

        Ok(recommendation)
    }

    #[instrument(skip(self))]
    pub async fn upvote(&self, id: i32) -> AppResult<Recommendation> {
        self.get_by_id_or_fail(id).await?;

        let recommendation = self.store.update_score(id, 1).await?;
        tracing::debug!(score = recommendation.score, "Upvoted");

        Ok(recommendation)
    }

    /// Decrements the score and deletes the record once it falls below -5
    ///
    /// The check uses the score after the decrement: -5 to -6 deletes,
    /// -4 to -5 does not.
    #[instrument(skip(self))]
    pub async fn downvote(&self, id: i32) -> AppResult<VoteOutcome> {
        self.get_by_id_or_fail(id).await?;

        let recommendation = self.store.update_score(id, -1).await?;
        tracing::debug!(score = recommendation.score, "Downvoted");

        if recommendation.score < DELETE_THRESHOLD {
            self.store.remove(id).await?;
            tracing::info!(score = recommendation.score, "Recommendation removed after downvote");
            return Ok(VoteOutcome::Removed(recommendation));
        }

        Ok(VoteOutcome::Updated(recommendation))
    }

    /// Every recommendation, in id order
    pub async fn get(&self) -> AppResult<Vec<Recommendation>> {
        self.store.find_all(None).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Recommendation> {
        self.get_by_id_or_fail(id).await
    }

    /// The `amount` highest-scoring recommendations, best first
    ///
    /// A negative amount is a caller bug and surfaces as `Internal`.
    pub async fn get_top(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        if amount < 0 {
            return Err(AppError::Internal(format!(
                "top amount must be non-negative, got {}",
                amount
            )));
        }

        self.store.get_top_by_score(amount).await
    }

    /// Random pick biased toward the high-score pool
    ///
    /// Draws the pool with `get_score_filter`, falls back to the other pool
    /// when the chosen one is empty, then picks uniformly within the pool.
    #[instrument(skip(self))]
    pub async fn get_random(&self) -> AppResult<Recommendation> {
        let filter = get_score_filter(self.random.unit());

        let mut pool = self.store.find_all(Some(filter)).await?;
        if pool.is_empty() {
            tracing::debug!(filter = %filter, "Score pool empty, falling back");
            pool = self.store.find_all(Some(filter.other())).await?;
        }

        if pool.is_empty() {
            return Err(AppError::not_found());
        }

        let index = self.random.index(pool.len());
        Ok(pool.swap_remove(index))
    }

    /// Deletes every recommendation
    pub async fn reset(&self) -> AppResult<()> {
        self.store.truncate().await
    }

    async fn get_by_id_or_fail(&self, id: i32) -> AppResult<Recommendation> {
        self.store.find(id).await?.ok_or_else(AppError::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MockRecommendationStore, services::random::{MockRandomSource, ThreadRandom}};
    use mockall::predicate::eq;

    const LINK: &str = "https://www.youtube.com/watch?v=G8kiL6BGmeQ";

    fn recommendation(id: i32, score: i32) -> Recommendation {
        Recommendation {
            id,
            name: format!("teste {id}"),
            link: LINK.to_string(),
            score,
        }
    }

    fn service(store: MockRecommendationStore, random: MockRandomSource) -> RecommendationService {
        RecommendationService::new(Arc::new(store), Arc::new(random))
    }

    fn service_with_store(store: MockRecommendationStore) -> RecommendationService {
        service(store, MockRandomSource::new())
    }

    fn assert_not_found(err: AppError) {
        match err {
            AppError::NotFound(msg) => assert!(msg.is_empty()),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_fresh_name() {
        let mut store = MockRecommendationStore::new();
        store.expect_find_by_name().times(1).returning(|_| Ok(None));
        store.expect_create().times(1).returning(|new| {
            Ok(Recommendation {
                id: 1,
                name: new.name,
                link: new.link,
                score: 0,
            })
        });

        let created = service_with_store(store)
            .insert(NewRecommendation::new("Falamansa", LINK))
            .await
            .unwrap();

        assert_eq!(created.score, 0);
        assert_eq!(created.name, "Falamansa");
    }

    #[tokio::test]
    async fn test_insert_conflict_does_not_write() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_find_by_name()
            .times(1)
            .returning(|_| Ok(Some(recommendation(10, 10))));
        store.expect_create().never();

        let err = service_with_store(store)
            .insert(NewRecommendation::new("teste 10", LINK))
            .await
            .unwrap_err();

        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "Recommendations names must be unique"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upvote_increments_by_one() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_find()
            .with(eq(1))
            .times(1)
            .returning(|id| Ok(Some(recommendation(id, 11))));
        store
            .expect_update_score()
            .with(eq(1), eq(1))
            .times(1)
            .returning(|id, delta| Ok(recommendation(id, 11 + delta)));

        let updated = service_with_store(store).upvote(1).await.unwrap();

        let mut expected = recommendation(1, 11);
        expected.score += 1;
        assert_eq!(updated, expected);
    }

    #[tokio::test]
    async fn test_upvote_unknown_id_is_not_found() {
        let mut store = MockRecommendationStore::new();
        store.expect_find().times(1).returning(|_| Ok(None));
        store.expect_update_score().never();

        let err = service_with_store(store).upvote(1).await.unwrap_err();
        assert_not_found(err);
    }

    #[tokio::test]
    async fn test_downvote_keeps_record_above_threshold() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_find()
            .returning(|id| Ok(Some(recommendation(id, 5))));
        store
            .expect_update_score()
            .with(eq(1), eq(-1))
            .times(1)
            .returning(|id, delta| Ok(recommendation(id, 5 + delta)));
        store.expect_remove().never();

        let outcome = service_with_store(store).downvote(1).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Updated(recommendation(1, 4)));
    }

    #[tokio::test]
    async fn test_downvote_to_minus_five_keeps_record() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_find()
            .returning(|id| Ok(Some(recommendation(id, -4))));
        store
            .expect_update_score()
            .returning(|id, delta| Ok(recommendation(id, -4 + delta)));
        store.expect_remove().never();

        let outcome = service_with_store(store).downvote(1).await.unwrap();
        assert!(!outcome.is_removed());
        assert_eq!(outcome.recommendation().score, -5);
    }

    #[tokio::test]
    async fn test_downvote_below_minus_five_removes() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_find()
            .returning(|id| Ok(Some(recommendation(id, -5))));
        store
            .expect_update_score()
            .returning(|id, delta| Ok(recommendation(id, -5 + delta)));
        store.expect_remove().with(eq(1)).times(1).returning(|_| Ok(()));

        let outcome = service_with_store(store).downvote(1).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Removed(recommendation(1, -6)));
    }

    #[tokio::test]
    async fn test_downvote_unknown_id_is_not_found() {
        let mut store = MockRecommendationStore::new();
        store.expect_find().returning(|_| Ok(None));
        store.expect_update_score().never();
        store.expect_remove().never();

        let err = service_with_store(store).downvote(1).await.unwrap_err();
        assert_not_found(err);
    }

    #[tokio::test]
    async fn test_get_returns_everything_unfiltered() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_find_all()
            .with(eq(None))
            .times(1)
            .returning(|_| Ok(vec![recommendation(1, 0), recommendation(2, 30)]));

        let all = service_with_store(store).get().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let mut store = MockRecommendationStore::new();
        store.expect_find().with(eq(9)).returning(|_| Ok(None));

        let err = service_with_store(store).get_by_id(9).await.unwrap_err();
        assert_not_found(err);
    }

    #[tokio::test]
    async fn test_get_top_returns_descending_scores() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_get_top_by_score()
            .with(eq(3))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    recommendation(1, 3),
                    recommendation(2, 2),
                    recommendation(3, 1),
                ])
            });

        let top = service_with_store(store).get_top(3).await.unwrap();
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|pair| pair[0].score > pair[1].score));
    }

    #[tokio::test]
    async fn test_get_top_negative_amount_is_internal_error() {
        let mut store = MockRecommendationStore::new();
        store.expect_get_top_by_score().never();

        let err = service_with_store(store).get_top(-1).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_score_filter_threshold() {
        assert_eq!(get_score_filter(0.0), ScoreFilter::Gt);
        assert_eq!(get_score_filter(0.5), ScoreFilter::Gt);
        assert_eq!(get_score_filter(0.699_999), ScoreFilter::Gt);
        assert_eq!(get_score_filter(0.7), ScoreFilter::Lte);
        assert_eq!(get_score_filter(0.8), ScoreFilter::Lte);
        assert_eq!(get_score_filter(0.999_999), ScoreFilter::Lte);
    }

    #[test]
    fn test_score_filter_distribution() {
        let random = ThreadRandom;
        let samples = 1000;
        let high = (0..samples)
            .filter(|_| get_score_filter(random.unit()) == ScoreFilter::Gt)
            .count();

        let ratio = high as f64 / samples as f64;
        assert!((0.62..=0.78).contains(&ratio), "ratio was {ratio}");
    }

    #[tokio::test]
    async fn test_get_random_high_pool() {
        let mut random = MockRandomSource::new();
        random.expect_unit().times(1).return_const(0.5);
        random.expect_index().with(eq(2)).times(1).return_const(1usize);

        let mut store = MockRecommendationStore::new();
        store
            .expect_find_all()
            .with(eq(Some(ScoreFilter::Gt)))
            .times(1)
            .returning(|_| Ok(vec![recommendation(1, 20), recommendation(2, 15)]));

        let picked = service(store, random).get_random().await.unwrap();
        assert_eq!(picked.id, 2);
    }

    #[tokio::test]
    async fn test_get_random_low_pool() {
        let mut random = MockRandomSource::new();
        random.expect_unit().return_const(0.8);
        random.expect_index().return_const(0usize);

        let mut store = MockRecommendationStore::new();
        store
            .expect_find_all()
            .with(eq(Some(ScoreFilter::Lte)))
            .times(1)
            .returning(|_| Ok(vec![recommendation(1, 10)]));

        let picked = service(store, random).get_random().await.unwrap();
        assert_eq!(picked.score, 10);
    }

    #[tokio::test]
    async fn test_get_random_falls_back_to_other_pool() {
        let mut random = MockRandomSource::new();
        random.expect_unit().return_const(0.1);
        random.expect_index().with(eq(1)).return_const(0usize);

        let mut store = MockRecommendationStore::new();
        store
            .expect_find_all()
            .with(eq(Some(ScoreFilter::Gt)))
            .times(1)
            .returning(|_| Ok(vec![]));
        store
            .expect_find_all()
            .with(eq(Some(ScoreFilter::Lte)))
            .times(1)
            .returning(|_| Ok(vec![recommendation(7, -2)]));

        let picked = service(store, random).get_random().await.unwrap();
        assert_eq!(picked.id, 7);
    }

    #[tokio::test]
    async fn test_get_random_empty_store_is_not_found() {
        let mut random = MockRandomSource::new();
        random.expect_unit().return_const(0.9);
        random.expect_index().never();

        let mut store = MockRecommendationStore::new();
        store.expect_find_all().times(2).returning(|_| Ok(vec![]));

        let err = service(store, random).get_random().await.unwrap_err();
        assert_not_found(err);
    }

    #[tokio::test]
    async fn test_reset_truncates_store() {
        let mut store = MockRecommendationStore::new();
        store.expect_truncate().times(1).returning(|| Ok(()));

        service_with_store(store).reset().await.unwrap();
    }
}
