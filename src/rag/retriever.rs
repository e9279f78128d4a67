//! Coarse retrieval: embed the query, ask the vector index for neighbours

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::embeddings::Encoder;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::index::ensure_dimension;
use crate::index::VectorIndexClient;
use crate::models::DocumentMetadata;
use crate::rag::Candidate;
use crate::rag::Query;

/// Retriever over a vector index
pub struct Retriever {
    encoder: Arc<dyn Encoder>,
    index: Arc<dyn VectorIndexClient>,
    index_timeout: Duration,
}

impl Retriever {
    /// Create a new retriever.
    ///
    /// Fails with `InvalidConfiguration` when the index reports a dimension
    /// different from the encoder's.
    pub fn new(
        encoder: Arc<dyn Encoder>,
        index: Arc<dyn VectorIndexClient>,
        index_timeout: Duration,
    ) -> Result<Self> {
        ensure_dimension(index.as_ref(), encoder.dimension())?;
        Ok(Self {
            encoder,
            index,
            index_timeout,
        })
    }

    /// Top-`top_k` candidates for `query`, in index order
    pub async fn search(&self, query: &Query, top_k: usize) -> Result<Vec<Candidate>> {
        if top_k == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "retrieval top_k must be positive".to_string(),
            ));
        }
        debug!("Performing semantic search (top_k={}): {}", top_k, query.text);

        let query_embedding = self.encoder.embed(&query.text).await?;

        let matches = tokio::time::timeout(
            self.index_timeout,
            self.index.query(&query_embedding, top_k),
        )
        .await
        .map_err(|_| {
            PostRagError::IndexUnavailable(format!(
                "query on '{}' timed out after {:?}",
                self.index.index_name(),
                self.index_timeout
            ))
        })??;

        if matches.len() > top_k {
            warn!(
                "Index returned {} matches for top_k={}, truncating",
                matches.len(),
                top_k
            );
        }

        let candidates: Vec<Candidate> = matches
            .into_iter()
            .take(top_k)
            .map(|m| Candidate {
                id: m.id,
                similarity_score: m.score,
                metadata: DocumentMetadata::from_map(m.metadata),
            })
            .collect();

        debug!("Retrieved {} candidates", candidates.len());
        Ok(candidates)
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        self.index.index_name()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::embeddings::HashingEncoder;
    use crate::index::IndexMatch;
    use crate::index::InMemoryIndex;
    use crate::models::Document;

    struct HangingIndex;

    #[async_trait]
    impl VectorIndexClient for HangingIndex {
        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<IndexMatch>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        async fn upsert(&self, _documents: &[Document]) -> Result<usize> {
            Ok(0)
        }

        fn dimension(&self) -> Option<usize> {
            None
        }

        fn index_name(&self) -> &str {
            "hanging"
        }
    }

    fn corpus(encoder: &HashingEncoder, texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Document {
                id: i.to_string(),
                embedding: encoder.encode(text),
                metadata: json!({ "subreddit": "GenAI", "body_text": text })
                    .as_object()
                    .cloned()
                    .unwrap(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_search_maps_metadata_and_preserves_order() {
        let encoder = Arc::new(HashingEncoder::new(256).unwrap());
        let docs = corpus(
            &encoder,
            &[
                "cooking pasta at home",
                "learn genai with free courses",
                "genai courses and genai books",
            ],
        );
        let index = Arc::new(InMemoryIndex::with_documents("posts", 256, docs).unwrap());
        let retriever = Retriever::new(encoder, index, Duration::from_secs(1)).unwrap();

        let results = retriever.search(&Query::new("genai courses"), 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].metadata.subreddit, "GenAI");
        assert!(results
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score));
        assert_eq!(results[2].body_text(), "cooking pasta at home");
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let encoder = Arc::new(HashingEncoder::new(8).unwrap());
        let index = Arc::new(InMemoryIndex::new("posts", 8));
        let retriever = Retriever::new(encoder, index, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            retriever.search(&Query::new("q"), 0).await,
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_fails_construction() {
        let encoder = Arc::new(HashingEncoder::new(384).unwrap());
        let index = Arc::new(InMemoryIndex::new("posts", 1536));
        assert!(matches!(
            Retriever::new(encoder, index, Duration::from_secs(1)),
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_index_timeout_is_index_unavailable() {
        let encoder = Arc::new(HashingEncoder::new(8).unwrap());
        let retriever =
            Retriever::new(encoder, Arc::new(HangingIndex), Duration::from_millis(50)).unwrap();

        let started = std::time::Instant::now();
        let result = retriever.search(&Query::new("anything"), 5).await;
        assert!(matches!(result, Err(PostRagError::IndexUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
