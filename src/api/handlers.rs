use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{NewRecommendation, Recommendation, VoteOutcome},
};

use super::AppState;

/// Most recent recommendations returned by the list endpoint
pub const LIST_LIMIT: usize = 10;

// Response types

#[derive(Debug, Serialize)]
pub struct DownvoteResponse {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    /// True when this downvote deleted the recommendation
    pub removed: bool,
}

impl From<VoteOutcome> for DownvoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        let removed = outcome.is_removed();
        let recommendation = match outcome {
            VoteOutcome::Updated(r) | VoteOutcome::Removed(r) => r,
        };
        Self {
            recommendation,
            removed,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Create a new recommendation
pub async fn create_recommendation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(candidate): Json<NewRecommendation>,
) -> AppResult<(StatusCode, Json<Recommendation>)> {
    candidate.validate()?;

    let recommendation = state.recommendations.insert(candidate).await?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = recommendation.id,
        "Recommendation created"
    );

    Ok((StatusCode::CREATED, Json(recommendation)))
}

/// Latest recommendations, newest first
pub async fn list_recommendations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let all = state.recommendations.get().await?;
    let latest = all.into_iter().rev().take(LIST_LIMIT).collect();
    Ok(Json(latest))
}

pub async fn get_recommendation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state.recommendations.get_by_id(id).await?;
    Ok(Json(recommendation))
}

pub async fn random_recommendation(
    State(state): State<AppState>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state.recommendations.get_random().await?;
    Ok(Json(recommendation))
}

/// Top recommendations by score
///
/// The amount is parsed here; anything that is not an integer is a 500.
pub async fn top_recommendations(
    State(state): State<AppState>,
    Path(amount): Path<String>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let amount: i64 = amount
        .parse()
        .map_err(|_| AppError::Internal(format!("invalid top amount: {}", amount)))?;

    let top = state.recommendations.get_top(amount).await?;
    Ok(Json(top))
}

pub async fn upvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i32>,
) -> AppResult<Json<Recommendation>> {
    let recommendation = state.recommendations.upvote(id).await?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = id,
        score = recommendation.score,
        "Upvote recorded"
    );

    Ok(Json(recommendation))
}

pub async fn downvote(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i32>,
) -> AppResult<Json<DownvoteResponse>> {
    let outcome = state.recommendations.downvote(id).await?;

    tracing::info!(
        request_id = %request_id,
        recommendation_id = id,
        score = outcome.recommendation().score,
        removed = outcome.is_removed(),
        "Downvote recorded"
    );

    Ok(Json(DownvoteResponse::from(outcome)))
}

/// Clears the store between end-to-end runs
pub async fn clear_database(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<StatusCode> {
    state.recommendations.reset().await?;
    tracing::warn!(request_id = %request_id, "All recommendations deleted");
    Ok(StatusCode::ACCEPTED)
}
