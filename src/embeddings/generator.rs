//! Embedding service: preprocessing, timeout and dimension checks around a backend

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tracing::info;

use super::EmbeddingClient;
use super::EmbeddingConfig;
use super::EmbeddingProvider;
use super::Encoder;
use super::HashingEncoder;
use super::text_preprocessing::preprocess_text_for_embedding;
use crate::errors::PostRagError;
use crate::errors::Result;

/// The query-time encoder handed to the retriever.
///
/// Wraps any [`Encoder`] backend; every call is bounded by `timeout` and every
/// returned vector is checked against the configured dimension.
pub struct EmbeddingService {
    backend: Arc<dyn Encoder>,
    dimension: usize,
    timeout: Duration,
    max_input_chars: usize,
}

impl EmbeddingService {
    /// Create a new embedding service from the application config
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config)?)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let backend: Arc<dyn Encoder> = match config.provider {
            EmbeddingProvider::Hashing => Arc::new(HashingEncoder::new(config.dimension)?),
            _ => Arc::new(EmbeddingClient::new(&config)?),
        };

        info!(
            "Embedding service ready: {:?} model={} dim={}",
            config.provider, config.model, config.dimension
        );

        Ok(Self::with_backend(
            backend,
            config.dimension,
            config.timeout,
            config.max_input_chars,
        ))
    }

    /// Wrap an existing backend
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn Encoder>,
        dimension: usize,
        timeout: Duration,
        max_input_chars: usize,
    ) -> Self {
        Self {
            backend,
            dimension,
            timeout,
            max_input_chars,
        }
    }
}

#[async_trait]
impl Encoder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let processed_text = preprocess_text_for_embedding(text, self.max_input_chars)?;

        let embedding = tokio::time::timeout(self.timeout, self.backend.embed(&processed_text))
            .await
            .map_err(|_| {
                PostRagError::ModelUnavailable(format!(
                    "embedding call timed out after {:?}",
                    self.timeout
                ))
            })??;

        if embedding.len() != self.dimension {
            return Err(PostRagError::EmbeddingDimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        debug!("Embedded query ({} chars) into {} dims", processed_text.len(), embedding.len());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    struct SlowEncoder;

    #[async_trait]
    impl Encoder for SlowEncoder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![0.0; 4])
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_hashing_service_roundtrip_is_bit_identical() {
        let mut config = crate::config::AppConfig::default();
        config.embeddings.provider = "hashing".to_string();
        let service = EmbeddingService::new(&config).unwrap();

        let a = service.embed("How to learn GenAI?").await.unwrap();
        let b = service.embed("How to learn GenAI?").await.unwrap();
        assert_eq!(a.len(), 384);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_reported() {
        let backend = Arc::new(HashingEncoder::new(8).unwrap());
        let service = EmbeddingService::with_backend(backend, 384, Duration::from_secs(1), 100);

        let result = service.embed("hello").await;
        assert!(matches!(
            result,
            Err(PostRagError::EmbeddingDimensionMismatch {
                expected: 384,
                actual: 8
            })
        ));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_before_backend_call() {
        let service =
            EmbeddingService::with_backend(Arc::new(SlowEncoder), 4, Duration::from_secs(10), 100);
        let started = Instant::now();
        let result = service.embed("   ").await;
        assert!(matches!(result, Err(PostRagError::InvalidQuery(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_timeout_returns_model_unavailable() {
        let service = EmbeddingService::with_backend(
            Arc::new(SlowEncoder),
            4,
            Duration::from_millis(50),
            100,
        );
        let started = Instant::now();
        let result = service.embed("hello").await;
        assert!(matches!(result, Err(PostRagError::ModelUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
