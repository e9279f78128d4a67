use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostRagError {
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Vector index not found: {0}")]
    IndexNotFound(String),

    #[error("Rerank model unavailable: {0}")]
    RerankModelUnavailable(String),

    #[error("Generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PostRagError {
    /// Whether this error came from an external backend call rather than from
    /// configuration or input validation
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::ModelUnavailable(_)
                | Self::EmbeddingDimensionMismatch { .. }
                | Self::IndexUnavailable(_)
                | Self::IndexNotFound(_)
                | Self::RerankModelUnavailable(_)
                | Self::GenerationUnavailable(_)
                | Self::GenerationTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PostRagError>;
