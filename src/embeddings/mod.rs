//! Embeddings generation module
//!
//! This module maps query text to fixed-length dense vectors. Providers:
//! - sentence-transformers HTTP sidecar (all-MiniLM-L6-v2 by default, 384 dims)
//! - OpenAI (text-embedding-3-small, etc.)
//! - Ollama (local models)
//! - Feature hashing (offline, deterministic, no model download)
//!
//! # Examples
//!
//! ```rust,no_run
//! use postrag::config::AppConfig;
//! use postrag::embeddings::{EmbeddingService, Encoder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed("How to learn GenAI?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;
pub mod hashing;
pub mod text_preprocessing;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

pub use client::EmbeddingClient;
pub use generator::EmbeddingService;
pub use hashing::HashingEncoder;
pub use text_preprocessing::preprocess_text_for_embedding;

use crate::errors::PostRagError;
use crate::errors::Result;

/// Dimension of all-MiniLM-L6-v2, the model the index was built with
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to a dense vector of a fixed dimension.
///
/// Implementations must be deterministic for a fixed model version and safe to
/// share across concurrent queries.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of every vector returned by [`Encoder::embed`]
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// sentence-transformers model served over HTTP (`/encode`)
    SentenceTransformers,
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
    /// In-process feature hashing
    Hashing,
}

impl EmbeddingProvider {
    /// Whether the provider talks to an HTTP endpoint
    #[must_use]
    pub const fn is_remote(self) -> bool {
        !matches!(self, Self::Hashing)
    }
}

impl FromStr for EmbeddingProvider {
    type Err = PostRagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentence-transformers" | "sentence_transformers" => Ok(Self::SentenceTransformers),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "hashing" => Ok(Self::Hashing),
            other => Err(PostRagError::InvalidConfiguration(format!(
                "unknown embedding provider '{other}' (expected sentence-transformers, openai, ollama or hashing)"
            ))),
        }
    }
}

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_input_chars: usize,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        let provider: EmbeddingProvider = config.embeddings.provider.parse()?;
        if provider == EmbeddingProvider::OpenAI && config.embeddings.api_key.is_none() {
            return Err(PostRagError::InvalidConfiguration(
                "OpenAI embeddings require embeddings.api_key or OPENAI_API_KEY".to_string(),
            ));
        }

        Ok(Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: config.embeddings.api_key.clone(),
            timeout: config.embedding_timeout(),
            max_input_chars: config.embeddings.max_input_chars,
        })
    }
}
