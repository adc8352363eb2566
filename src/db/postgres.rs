use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{NewRecommendation, Recommendation, ScoreFilter, HIGH_SCORE_THRESHOLD},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the schema in `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL implementation of the recommendation store
#[derive(Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn create(&self, new: NewRecommendation) -> AppResult<Recommendation> {
        let result = sqlx::query_as::<_, Recommendation>(
            r#"
            INSERT INTO recommendations (name, youtube_link)
            VALUES ($1, $2)
            RETURNING id, name, youtube_link, score
            "#,
        )
        .bind(&new.name)
        .bind(&new.link)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(recommendation) => Ok(recommendation),
            // A concurrent insert won the race past the service's name check
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "Recommendations names must be unique".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Recommendation>> {
        let recommendation = sqlx::query_as::<_, Recommendation>(
            "SELECT id, name, youtube_link, score FROM recommendations WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recommendation)
    }

    async fn find(&self, id: i32) -> AppResult<Option<Recommendation>> {
        let recommendation = sqlx::query_as::<_, Recommendation>(
            "SELECT id, name, youtube_link, score FROM recommendations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recommendation)
    }

    async fn update_score(&self, id: i32, delta: i32) -> AppResult<Recommendation> {
        sqlx::query_as::<_, Recommendation>(
            r#"
            UPDATE recommendations
            SET score = score + $2
            WHERE id = $1
            RETURNING id, name, youtube_link, score
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(AppError::not_found)
    }

    async fn remove(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_all(&self, filter: Option<ScoreFilter>) -> AppResult<Vec<Recommendation>> {
        let query = match filter {
            None => "SELECT id, name, youtube_link, score FROM recommendations ORDER BY id",
            Some(ScoreFilter::Gt) => {
                "SELECT id, name, youtube_link, score FROM recommendations WHERE score > $1 ORDER BY id"
            }
            Some(ScoreFilter::Lte) => {
                "SELECT id, name, youtube_link, score FROM recommendations WHERE score <= $1 ORDER BY id"
            }
        };

        let mut statement = sqlx::query_as::<_, Recommendation>(query);
        if filter.is_some() {
            statement = statement.bind(HIGH_SCORE_THRESHOLD);
        }

        let recommendations = statement.fetch_all(&self.pool).await?;
        Ok(recommendations)
    }

    async fn get_top_by_score(&self, amount: i64) -> AppResult<Vec<Recommendation>> {
        if amount < 0 {
            return Err(AppError::Internal(format!("invalid amount: {}", amount)));
        }

        let recommendations = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT id, name, youtube_link, score FROM recommendations
            ORDER BY score DESC, id ASC
            LIMIT $1
            "#,
        )
        .bind(amount)
        .fetch_all(&self.pool)
        .await?;

        Ok(recommendations)
    }

    async fn truncate(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE TABLE recommendations")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
