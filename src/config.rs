use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Location of the vector index snapshot
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Name recorded in the snapshot, checked on load
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Candidates retrieved per HTTP request
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates retrieved per interactive query
    #[serde(default = "default_chat_top_k")]
    pub chat_top_k: usize,

    /// Groq (or other OpenAI-compatible) API key for completions
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// Chat completions base URL
    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,

    /// Completion model used for reranking
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Upper bound on a single completion attempt
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Extra attempts after an upstream completion failure
    #[serde(default)]
    pub llm_max_retries: u32,

    /// Delay before the first retry, doubled on each further attempt
    #[serde(default = "default_llm_retry_backoff_ms")]
    pub llm_retry_backoff_ms: u64,

    /// Reject selections that are not one of the retrieved titles
    #[serde(default = "default_strict_selection")]
    pub strict_selection: bool,

    /// Embeddings base URL
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Optional bearer token for the embeddings endpoint
    #[serde(default)]
    pub embedding_api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_secs")]
    pub embedding_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./movie_db/movies.json")
}

fn default_collection_name() -> String {
    "movies".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_chat_top_k() -> usize {
    3
}

fn default_llm_api_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_llm_retry_backoff_ms() -> u64 {
    500
}

fn default_strict_selection() -> bool {
    true
}

fn default_embedding_api_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_embedding_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.top_k == 0 || self.chat_top_k == 0 {
            anyhow::bail!("TOP_K and CHAT_TOP_K must be positive");
        }
        if self.llm_timeout_secs == 0 {
            anyhow::bail!("LLM_TIMEOUT_SECS must be positive");
        }
        if self.embedding_timeout_secs == 0 {
            anyhow::bail!("EMBEDDING_TIMEOUT_SECS must be positive");
        }
        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.llm_retry_backoff_ms)
    }

    /// Returns the completion API key, failing when it was never configured
    pub fn require_llm_api_key(&self) -> anyhow::Result<&str> {
        self.groq_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("GROQ_API_KEY must be set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>();
        envy::from_iter::<_, Config>(vars).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.chat_top_k, 3);
        assert_eq!(config.llm_model, "openai/gpt-oss-120b");
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.llm_max_retries, 0);
        assert!(config.strict_selection);
        assert_eq!(config.index_path, PathBuf::from("./movie_db/movies.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "9090"),
            ("TOP_K", "3"),
            ("STRICT_SELECTION", "false"),
            ("LLM_MAX_RETRIES", "2"),
            ("GROQ_API_KEY", "gsk_test"),
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.top_k, 3);
        assert!(!config.strict_selection);
        assert_eq!(config.llm_max_retries, 2);
        assert_eq!(config.require_llm_api_key().unwrap(), "gsk_test");
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let config = from_pairs(&[("TOP_K", "0")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let config = from_pairs(&[("EMBEDDING_TIMEOUT_SECS", "0")]);
        assert!(config.validate().is_err());

        let config = from_pairs(&[("LLM_TIMEOUT_SECS", "0")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key() {
        let config = from_pairs(&[("GROQ_API_KEY", "  ")]);
        assert!(config.require_llm_api_key().is_err());
    }
}
