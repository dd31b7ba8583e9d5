use std::sync::Arc;

use crate::{
    db::MovieIndex,
    error::{AppError, AppResult},
    models::Candidate,
};

/// First stage of the pipeline: cheap similarity search over the index
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn MovieIndex>,
}

impl Retriever {
    pub fn new(index: Arc<dyn MovieIndex>) -> Self {
        Self { index }
    }

    /// Returns at most `k` candidates, most similar first
    ///
    /// An empty result is reported as `NotFound` so callers never hand an empty set to the
    /// reranker.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Candidate>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }
        if k == 0 {
            return Err(AppError::InvalidInput(
                "Number of candidates must be positive".to_string(),
            ));
        }

        let candidates = self.index.search(query, k).await?;

        if candidates.is_empty() {
            return Err(AppError::NotFound("No relevant movies found.".to_string()));
        }

        tracing::info!(
            k,
            found = candidates.len(),
            "Candidates retrieved via vector search"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::vector_index::MockMovieIndex;
    use mockall::predicate::{eq, function};

    fn candidate(id: &str, title: &str, score: f32) -> Candidate {
        Candidate {
            id: id.to_string(),
            title: title.to_string(),
            overview: format!("Overview of {}", title),
            score,
        }
    }

    #[tokio::test]
    async fn test_search_passes_query_and_k_through() {
        let mut index = MockMovieIndex::new();
        index
            .expect_search()
            .with(function(|q: &str| q == "quiet space drama"), eq(3))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    candidate("3", "Blade Runner 2049", 0.8),
                    candidate("5", "Arrival", 0.7),
                ])
            });

        let retriever = Retriever::new(Arc::new(index));
        let results = retriever.search("quiet space drama", 3).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Blade Runner 2049");
    }

    #[tokio::test]
    async fn test_empty_result_is_not_found() {
        let mut index = MockMovieIndex::new();
        index.expect_search().returning(|_, _| Ok(vec![]));

        let retriever = Retriever::new(Arc::new(index));
        let err = retriever.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_search() {
        let mut index = MockMovieIndex::new();
        index.expect_search().never();

        let retriever = Retriever::new(Arc::new(index));
        let err = retriever.search("   ", 5).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected() {
        let mut index = MockMovieIndex::new();
        index.expect_search().never();

        let retriever = Retriever::new(Arc::new(index));
        assert!(matches!(
            retriever.search("space", 0).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_index_errors_propagate() {
        let mut index = MockMovieIndex::new();
        index
            .expect_search()
            .returning(|_, _| Err(AppError::Upstream("embedding service down".to_string())));

        let retriever = Retriever::new(Arc::new(index));
        let err = retriever.search("space", 5).await.unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }
}
