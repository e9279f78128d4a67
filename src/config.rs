use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmProvider;
use crate::PostRagError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub backtrace: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            backtrace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// One of `sentence-transformers`, `openai`, `ollama`, `hashing`
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
    /// Longer query texts are cut at a word boundary before embedding
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_embedding_provider() -> String {
    "sentence-transformers".to_string()
}

fn default_embedding_endpoint() -> String {
    "http://localhost:8420".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

const fn default_embedding_dimension() -> usize {
    384
}

const fn default_embedding_timeout() -> u64 {
    10
}

const fn default_max_input_chars() -> usize {
    1500
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            timeout_secs: default_embedding_timeout(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_control_plane")]
    pub control_plane: String,
    /// Data-plane host; when unset it is resolved by describing the index
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
}

fn default_index_name() -> String {
    "reddit-genai".to_string()
}

fn default_control_plane() -> String {
    "https://api.pinecone.io".to_string()
}

const fn default_index_timeout() -> u64 {
    10
}

const fn default_upsert_batch_size() -> usize {
    100
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            api_key: None,
            control_plane: default_control_plane(),
            host: None,
            namespace: None,
            timeout_secs: default_index_timeout(),
            upsert_batch_size: default_upsert_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    #[serde(default = "default_reranker_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_reranker_model")]
    pub model: String,
    #[serde(default = "default_reranker_timeout")]
    pub timeout_secs: u64,
}

fn default_reranker_endpoint() -> String {
    "http://localhost:8421".to_string()
}

fn default_reranker_model() -> String {
    "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string()
}

const fn default_reranker_timeout() -> u64 {
    30
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_reranker_endpoint(),
            model: default_reranker_model(),
            timeout_secs: default_reranker_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `openai` or `ollama`
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Replaces the default answer instruction
    #[serde(default)]
    pub answer_prompt: Option<String>,
    #[serde(default)]
    pub summarization_prompt: Option<String>,
}

fn default_llm_provider() -> String {
    "ollama".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "mistral".to_string()
}

const fn default_max_tokens() -> u32 {
    512
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            openai_endpoint: default_openai_endpoint(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            ollama_endpoint: default_ollama_endpoint(),
            ollama_model: default_ollama_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            answer_prompt: None,
            summarization_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k_retrieve")]
    pub top_k_retrieve: usize,
    #[serde(default = "default_top_k_rerank")]
    pub top_k_rerank: usize,
    #[serde(default = "default_max_context_docs")]
    pub max_context_docs: usize,
    #[serde(default)]
    pub max_doc_chars: Option<usize>,
}

const fn default_top_k_retrieve() -> usize {
    50
}

const fn default_top_k_rerank() -> usize {
    5
}

const fn default_max_context_docs() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k_retrieve: default_top_k_retrieve(),
            top_k_rerank: default_top_k_rerank(),
            max_context_docs: default_max_context_docs(),
            max_doc_chars: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default = "default_timeout_per_query")]
    pub timeout_per_query_secs: u64,
    /// 1 runs questions sequentially
    #[serde(default = "default_eval_parallelism")]
    pub parallelism: usize,
    #[serde(default)]
    pub max_queries: Option<usize>,
}

const fn default_timeout_per_query() -> u64 {
    20
}

const fn default_eval_parallelism() -> usize {
    1
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            timeout_per_query_secs: default_timeout_per_query(),
            parallelism: default_eval_parallelism(),
            max_queries: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub eval: EvalConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, fill secrets from the environment and validate
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(PostRagError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Fill API keys that are not in the file from `OPENAI_API_KEY` / `PINECONE_API_KEY`
    pub fn apply_env_overrides(&mut self) {
        if self.llm.openai_api_key.is_none() {
            self.llm.openai_api_key = non_empty_env("OPENAI_API_KEY");
        }
        if self.index.api_key.is_none() {
            self.index.api_key = non_empty_env("PINECONE_API_KEY");
        }
        if self.embeddings.api_key.is_none() && self.embeddings.provider == "openai" {
            self.embeddings.api_key = non_empty_env("OPENAI_API_KEY");
        }
    }

    /// Check the settings that must hold before any component is constructed
    pub fn validate(&self) -> crate::Result<()> {
        let search = &self.search;
        if search.top_k_retrieve == 0 || search.top_k_rerank == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "top_k_retrieve and top_k_rerank must be positive".to_string(),
            ));
        }
        if search.top_k_rerank > search.top_k_retrieve {
            return Err(PostRagError::InvalidConfiguration(format!(
                "top_k_rerank ({}) must not exceed top_k_retrieve ({})",
                search.top_k_rerank, search.top_k_retrieve
            )));
        }
        if search.max_context_docs == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "max_context_docs must be positive".to_string(),
            ));
        }

        let provider: EmbeddingProvider = self.embeddings.provider.parse()?;
        if provider.is_remote() {
            validate_endpoint("embeddings.endpoint", &self.embeddings.endpoint)?;
        }
        if self.embeddings.dimension == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "embeddings.dimension must be positive".to_string(),
            ));
        }
        if self.embeddings.max_input_chars == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "embeddings.max_input_chars must be positive".to_string(),
            ));
        }

        let _: LlmProvider = self.llm.provider.parse()?;
        validate_endpoint("llm.openai_endpoint", &self.llm.openai_endpoint)?;
        validate_endpoint("llm.ollama_endpoint", &self.llm.ollama_endpoint)?;
        validate_endpoint("reranker.endpoint", &self.reranker.endpoint)?;
        validate_endpoint("index.control_plane", &self.index.control_plane)?;
        if let Some(host) = &self.index.host {
            validate_endpoint("index.host", host)?;
        }
        if self.index.index_name.trim().is_empty() {
            return Err(PostRagError::InvalidConfiguration(
                "index.index_name must not be empty".to_string(),
            ));
        }

        for (name, secs) in [
            ("embeddings.timeout_secs", self.embeddings.timeout_secs),
            ("index.timeout_secs", self.index.timeout_secs),
            ("reranker.timeout_secs", self.reranker.timeout_secs),
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("eval.timeout_per_query_secs", self.eval.timeout_per_query_secs),
        ] {
            if secs == 0 {
                return Err(PostRagError::InvalidConfiguration(format!(
                    "{name} must be positive"
                )));
            }
        }

        Ok(())
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embeddings.timeout_secs)
    }

    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index.timeout_secs)
    }

    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_secs(self.reranker.timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    /// Model name of the configured LLM provider
    pub fn llm_model(&self) -> crate::Result<&str> {
        Ok(match self.llm.provider.parse::<LlmProvider>()? {
            LlmProvider::OpenAI => &self.llm.openai_model,
            LlmProvider::Ollama => &self.llm.ollama_model,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn validate_endpoint(name: &str, endpoint: &str) -> crate::Result<()> {
    let parsed = url::Url::parse(endpoint).map_err(|e| {
        PostRagError::InvalidConfiguration(format!("{name} is not a valid URL ({endpoint}): {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(PostRagError::InvalidConfiguration(format!(
            "{name} must use http or https, got {other}"
        ))),
    }
}
