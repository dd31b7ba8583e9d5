//! OpenAI-compatible HTTP provider
//!
//! Speaks the `/chat/completions` and `/embeddings` dialect shared by Groq, OpenAI, Ollama,
//! LM Studio and most hosted gateways. One client instance is built at startup and shared by
//! every request; `reqwest::Client` pools connections internally.
//!
//! API Flow:
//! 1. Completion: POST {base}/chat/completions → choices[0].message.content
//! 2. Embedding: POST {base}/embeddings → data[].embedding (ordered by `index`)

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::providers::{CompletionProvider, EmbeddingProvider},
};

/// Connection settings for one OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiCompatibleClient {
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POSTs a JSON body and returns the response text, mapping failures to upstream errors
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> AppResult<String> {
        let mut request = self.http_client.post(self.endpoint(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                model = %self.model,
                "Model API request failed"
            );
            return Err(AppError::Upstream(format!(
                "{} returned status {}: {}",
                path, status, body
            )));
        }

        Ok(response.text().await?)
    }

    fn parse_chat_response(&self, raw: &str) -> AppResult<String> {
        let parsed: ChatResponse = serde_json::from_str(raw).map_err(|e| {
            tracing::error!(error = %e, response = %raw, "Failed to deserialize chat response");
            AppError::Upstream(format!("Unreadable chat completion envelope: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| AppError::Upstream("Chat completion contained no content".to_string()))
    }

    fn parse_embedding_response(&self, raw: &str, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        let mut parsed: EmbeddingResponse = serde_json::from_str(raw).map_err(|e| {
            AppError::Upstream(format!("Unreadable embedding response: {}", e))
        })?;

        if parsed.data.len() != expected {
            return Err(AppError::Upstream(format!(
                "Expected {} embeddings, received {}",
                expected,
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str, structured_output: bool) -> AppResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: structured_output.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting completion");

        let raw = self.post_json("chat/completions", &request).await?;
        let content = self.parse_chat_response(&raw)?;

        tracing::debug!(model = %self.model, content_chars = content.len(), "Completion received");

        Ok(content)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiCompatibleClient {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let raw = self.post_json("embeddings", &request).await?;
        let embeddings = self.parse_embedding_response(&raw, texts.len())?;

        tracing::debug!(
            model = %self.model,
            inputs = texts.len(),
            dimension = embeddings.first().map(Vec::len).unwrap_or(0),
            "Embeddings received"
        );

        Ok(embeddings)
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }
}
