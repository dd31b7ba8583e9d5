use crate::{
    error::AppResult,
    models::RecommendationOutcome,
    services::{reranker::Reranker, retriever::Retriever},
};

/// Retrieval-then-rerank recommendation pipeline
///
/// Holds no per-request state. The retriever and reranker share long-lived handles to the index
/// and the completion client, so one pipeline can serve concurrent requests.
#[derive(Clone)]
pub struct RecommendationPipeline {
    retriever: Retriever,
    reranker: Reranker,
    default_k: usize,
}

impl RecommendationPipeline {
    pub fn new(retriever: Retriever, reranker: Reranker, default_k: usize) -> Self {
        Self {
            retriever,
            reranker,
            default_k,
        }
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Recommends a movie for `query` using the configured number of candidates
    pub async fn recommend(&self, query: &str) -> AppResult<RecommendationOutcome> {
        self.recommend_with_k(query, self.default_k).await
    }

    /// Recommends a movie for `query`, retrieving at most `k` candidates
    ///
    /// Retrieval errors (including `NotFound`) and rerank errors propagate unchanged; there is
    /// no partial result.
    pub async fn recommend_with_k(&self, query: &str, k: usize) -> AppResult<RecommendationOutcome> {
        tracing::info!(query = %query, k, "Processing recommendation");

        let candidates = self.retriever.search(query, k).await?;
        let recommendation = self.reranker.select(query, &candidates).await?;

        Ok(RecommendationOutcome {
            recommendation,
            candidates: candidates.into_iter().map(|c| c.title).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::vector_index::MockMovieIndex,
        error::AppError,
        models::Candidate,
        services::{providers::MockCompletionProvider, reranker::RerankerOptions},
    };
    use mockall::predicate::{always, eq};
    use std::sync::Arc;

    fn candidate(title: &str) -> Candidate {
        Candidate {
            id: title.to_lowercase(),
            title: title.to_string(),
            overview: format!("{} overview", title),
            score: 0.3,
        }
    }

    fn pipeline(index: MockMovieIndex, completion: MockCompletionProvider) -> RecommendationPipeline {
        RecommendationPipeline::new(
            Retriever::new(Arc::new(index)),
            Reranker::new(Arc::new(completion), RerankerOptions::default()),
            5,
        )
    }

    #[tokio::test]
    async fn test_recommend_returns_selection_and_candidate_titles() {
        let mut index = MockMovieIndex::new();
        index
            .expect_search()
            .with(always(), eq(5))
            .returning(|_, _| Ok(vec![candidate("Arrival"), candidate("Her")]));

        let mut completion = MockCompletionProvider::new();
        completion.expect_complete().times(1).returning(|_, _| {
            Ok(r#"{"selected_movie": "Arrival", "reason": "Grief, time and aliens."}"#.to_string())
        });

        let outcome = pipeline(index, completion)
            .recommend("melancholy first contact")
            .await
            .unwrap();

        assert_eq!(outcome.recommendation.selected_title, "Arrival");
        assert_eq!(outcome.candidates, vec!["Arrival", "Her"]);
    }

    #[tokio::test]
    async fn test_explicit_k_overrides_default() {
        let mut index = MockMovieIndex::new();
        index
            .expect_search()
            .with(always(), eq(2))
            .times(1)
            .returning(|_, _| Ok(vec![candidate("Whiplash")]));

        let mut completion = MockCompletionProvider::new();
        completion.expect_complete().returning(|_, _| {
            Ok(r#"{"selected_movie": "Whiplash", "reason": "Intense."}"#.to_string())
        });

        let outcome = pipeline(index, completion)
            .recommend_with_k("drums", 2)
            .await
            .unwrap();
        assert_eq!(outcome.candidates, vec!["Whiplash"]);
    }

    #[tokio::test]
    async fn test_not_found_skips_reranker() {
        let mut index = MockMovieIndex::new();
        index.expect_search().returning(|_, _| Ok(vec![]));

        let mut completion = MockCompletionProvider::new();
        completion.expect_complete().never();

        let err = pipeline(index, completion)
            .recommend("anything")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_malformed_reply_propagates() {
        let mut index = MockMovieIndex::new();
        index
            .expect_search()
            .returning(|_, _| Ok(vec![candidate("Her")]));

        let mut completion = MockCompletionProvider::new();
        completion
            .expect_complete()
            .returning(|_, _| Ok("Her, definitely.".to_string()));

        let err = pipeline(index, completion)
            .recommend("lonely")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }
}
