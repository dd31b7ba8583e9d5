use serde::{Deserialize, Serialize};

/// The reranker's pick among the retrieved candidates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(rename = "selected_movie")]
    pub selected_title: String,
    pub reason: String,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOutcome {
    pub recommendation: Recommendation,
    /// Titles handed to the reranker, in retrieval order
    pub candidates: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub user_query: String,
    pub recommendation: Recommendation,
    pub debug_candidates: Vec<String>,
}

impl RecommendResponse {
    pub fn new(user_query: String, outcome: RecommendationOutcome) -> Self {
        Self {
            user_query,
            recommendation: outcome.recommendation,
            debug_candidates: outcome.candidates,
        }
    }
}
