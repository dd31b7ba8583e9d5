use std::{sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, Recommendation},
    services::{prompt::build_rerank_prompt, providers::CompletionProvider, retry::RetryPolicy},
};

/// Reranker behaviour knobs
#[derive(Debug, Clone, Copy)]
pub struct RerankerOptions {
    /// Bound on a single completion attempt
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Require the selection to name one of the candidates
    pub strict_selection: bool,
}

impl Default for RerankerOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::none(),
            strict_selection: true,
        }
    }
}

/// Second stage of the pipeline: asks the completion model to pick one candidate
#[derive(Clone)]
pub struct Reranker {
    completion: Arc<dyn CompletionProvider>,
    options: RerankerOptions,
}

/// Shape the model is told to reply with
///
/// Fields are optional here so a missing field is reported as a malformed reply instead of a
/// serde message about the envelope.
#[derive(Debug, Deserialize)]
struct RawSelection {
    selected_movie: Option<String>,
    reason: Option<String>,
}

impl Reranker {
    pub fn new(completion: Arc<dyn CompletionProvider>, options: RerankerOptions) -> Self {
        Self {
            completion,
            options,
        }
    }

    /// Picks the single best candidate for `query`
    pub async fn select(&self, query: &str, candidates: &[Candidate]) -> AppResult<Recommendation> {
        if candidates.is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot rerank an empty candidate set".to_string(),
            ));
        }

        let prompt = build_rerank_prompt(query, candidates);
        let prompt = prompt.as_str();
        let completion = &self.completion;
        let timeout = self.options.timeout;

        let raw = self
            .options
            .retry
            .execute(|| async move {
                tokio::time::timeout(timeout, completion.complete(prompt, true))
                    .await
                    .map_err(|_| {
                        AppError::Upstream(format!(
                            "Completion timed out after {}ms",
                            timeout.as_millis()
                        ))
                    })?
            })
            .await
            .inspect_err(|e| {
                tracing::error!(kind = e.kind(), error = %e, "Completion call failed");
            })?;

        let recommendation = parse_selection(&raw, candidates, self.options.strict_selection)
            .inspect_err(|e| {
                tracing::error!(kind = e.kind(), error = %e, response = %raw, "Unusable completion");
            })?;

        tracing::info!(
            selected = %recommendation.selected_title,
            candidates = candidates.len(),
            "Candidate selected by reranker"
        );

        Ok(recommendation)
    }
}

/// Validates a raw completion into a `Recommendation`
///
/// Both fields must be present and non-blank. With `strict` set the title must match a
/// candidate (ignoring case and surrounding whitespace) and is replaced by the candidate's
/// exact spelling.
pub fn parse_selection(
    raw: &str,
    candidates: &[Candidate],
    strict: bool,
) -> AppResult<Recommendation> {
    let parsed: RawSelection = serde_json::from_str(raw.trim())
        .map_err(|e| AppError::MalformedResponse(format!("Response is not a JSON object: {}", e)))?;

    let selected = non_blank(parsed.selected_movie, "selected_movie")?;
    let reason = non_blank(parsed.reason, "reason")?;

    let wanted = selected.to_lowercase();
    let matched = candidates
        .iter()
        .find(|c| c.title.trim().to_lowercase() == wanted);

    let selected_title = match (matched, strict) {
        (Some(candidate), _) => candidate.title.clone(),
        (None, true) => {
            return Err(AppError::MalformedResponse(format!(
                "Selected movie '{}' is not among the candidates",
                selected
            )))
        }
        (None, false) => {
            tracing::warn!(selected = %selected, "Selection is not among the retrieved candidates");
            selected
        }
    };

    Ok(Recommendation {
        selected_title,
        reason,
    })
}

fn non_blank(value: Option<String>, field: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(AppError::MalformedResponse(format!("Field '{}' is empty", field))),
        None => Err(AppError::MalformedResponse(format!("Field '{}' is missing", field))),
    }
}
