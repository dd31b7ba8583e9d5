#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use vibecheck::{
    db::{EmbeddedIndex, MovieIndex},
    services::{
        ingestion,
        providers::{CompletionProvider, EmbeddingProvider},
        RecommendationPipeline, Reranker, RerankerOptions, Retriever,
    },
    AppError, AppResult,
};

/// Embeds text onto a handful of fixed themes so similarity is predictable offline
pub struct ThemeEmbedder;

const THEMES: &[&[&str]] = &[
    &["space", "spacecraft", "alien", "blade runner", "future"],
    &["music", "drummer", "conservatory"],
    &["paris", "european", "hotel"],
    &["tokyo", "insomnia"],
    &["lonely", "sad", "insomnia", "secret"],
];

#[async_trait::async_trait]
impl EmbeddingProvider for ThemeEmbedder {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                let mut v: Vec<f32> = THEMES
                    .iter()
                    .map(|words| words.iter().filter(|w| text.contains(*w)).count() as f32)
                    .collect();
                v.push(0.05);
                v
            })
            .collect())
    }

    fn model_id(&self) -> String {
        "theme-test".to_string()
    }
}

/// Completion double with a fixed behaviour
pub enum FakeCompletion {
    Reply(String),
    Fail(String),
    Hang,
}

#[async_trait::async_trait]
impl CompletionProvider for FakeCompletion {
    async fn complete(&self, _prompt: &str, _structured_output: bool) -> AppResult<String> {
        match self {
            FakeCompletion::Reply(text) => Ok(text.clone()),
            FakeCompletion::Fail(msg) => Err(AppError::Upstream(msg.clone())),
            FakeCompletion::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

pub async fn seeded_index() -> Arc<dyn MovieIndex> {
    let index = EmbeddedIndex::in_memory(Arc::new(ThemeEmbedder), "movies");
    ingestion::ingest(&index, ingestion::seed_movies())
        .await
        .unwrap();
    Arc::new(index)
}

pub fn empty_index() -> Arc<dyn MovieIndex> {
    Arc::new(EmbeddedIndex::in_memory(Arc::new(ThemeEmbedder), "movies"))
}

pub fn pipeline(
    index: Arc<dyn MovieIndex>,
    completion: FakeCompletion,
    options: RerankerOptions,
) -> RecommendationPipeline {
    RecommendationPipeline::new(
        Retriever::new(index),
        Reranker::new(Arc::new(completion), options),
        5,
    )
}

pub fn reply(selected: &str, reason: &str) -> FakeCompletion {
    FakeCompletion::Reply(
        serde_json::json!({ "selected_movie": selected, "reason": reason }).to_string(),
    )
}
