use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Score at or below which a recommendation belongs to the low pool
pub const HIGH_SCORE_THRESHOLD: i32 = 10;

/// Score pool used by random selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScoreFilter {
    /// score > 10
    Gt,
    /// score <= 10
    Lte,
}

impl ScoreFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreFilter::Gt => "gt",
            ScoreFilter::Lte => "lte",
        }
    }

    /// The opposite pool, used as the fallback when this one is empty
    pub fn other(self) -> Self {
        match self {
            ScoreFilter::Gt => ScoreFilter::Lte,
            ScoreFilter::Lte => ScoreFilter::Gt,
        }
    }

    pub fn matches(self, score: i32) -> bool {
        match self {
            ScoreFilter::Gt => score > HIGH_SCORE_THRESHOLD,
            ScoreFilter::Lte => score <= HIGH_SCORE_THRESHOLD,
        }
    }
}

impl Display for ScoreFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_boundary() {
        assert!(ScoreFilter::Gt.matches(11));
        assert!(!ScoreFilter::Gt.matches(10));
        assert!(ScoreFilter::Lte.matches(10));
        assert!(ScoreFilter::Lte.matches(-5));
        assert!(!ScoreFilter::Lte.matches(11));
    }

    #[test]
    fn test_other_and_tags() {
        assert_eq!(ScoreFilter::Gt.other(), ScoreFilter::Lte);
        assert_eq!(ScoreFilter::Lte.other(), ScoreFilter::Gt);
        assert_eq!(ScoreFilter::Gt.to_string(), "gt");
        assert_eq!(serde_json::to_string(&ScoreFilter::Lte).unwrap(), "\"lte\"");
    }
}
