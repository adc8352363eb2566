pub mod recommendation;
pub mod score_filter;

pub use recommendation::{NewRecommendation, Recommendation, VoteOutcome};
pub use score_filter::{ScoreFilter, HIGH_SCORE_THRESHOLD};
