use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Hosts accepted as the media platform of a recommendation link
const ALLOWED_LINK_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// A named link to media content with a community score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Store-assigned identifier, never reused
    pub id: i32,
    /// Unique display name
    pub name: String,
    /// Link to the media on the recommendation platform
    #[serde(rename = "youtubeLink")]
    #[sqlx(rename = "youtube_link")]
    pub link: String,
    /// Upvotes minus downvotes
    pub score: i32,
}

/// Candidate submitted for creation
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewRecommendation {
    pub name: String,
    #[serde(rename = "youtubeLink", alias = "link")]
    pub link: String,
}

impl NewRecommendation {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }

    /// Checks the shape of a candidate before it reaches the service
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }

        if self.link.trim().is_empty() {
            return Err(AppError::Validation("youtubeLink must not be empty".to_string()));
        }

        if !is_platform_link(self.link.trim()) {
            return Err(AppError::Validation(
                "youtubeLink must point to a YouTube video".to_string(),
            ));
        }

        Ok(())
    }
}

/// Accepts `[http[s]://]host/path` where host is one of the platform hosts
/// and the path is non-empty.
fn is_platform_link(link: &str) -> bool {
    let without_scheme = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);

    let Some((host, path)) = without_scheme.split_once('/') else {
        return false;
    };

    ALLOWED_LINK_HOSTS
        .iter()
        .any(|allowed| host.eq_ignore_ascii_case(allowed))
        && !path.is_empty()
}

/// Outcome of a downvote
///
/// Removal is reported explicitly so callers can tell an updated record
/// from one that crossed the deletion threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The record remains with its new score
    Updated(Recommendation),
    /// The record dropped below the threshold and was deleted; carries its final state
    Removed(Recommendation),
}

impl VoteOutcome {
    pub fn recommendation(&self) -> &Recommendation {
        match self {
            VoteOutcome::Updated(r) | VoteOutcome::Removed(r) => r,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, VoteOutcome::Removed(_))
    }
}
