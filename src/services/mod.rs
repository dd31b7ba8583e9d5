pub mod ingestion;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod reranker;
pub mod retriever;
pub mod retry;

pub use recommendations::RecommendationPipeline;
pub use reranker::{Reranker, RerankerOptions};
pub use retriever::Retriever;
pub use retry::RetryPolicy;
