//! Vector index clients
//!
//! A [`VectorIndexClient`] answers nearest-neighbour queries over the embedded
//! posts. Two backends are provided:
//! - [`PineconeIndex`]: the remote index the corpus is published to
//! - [`InMemoryIndex`]: brute-force cosine search, for local corpora and tests

pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use tracing::info;

pub use memory::InMemoryIndex;
pub use pinecone::PineconeIndex;

use crate::errors::PostRagError;
use crate::errors::Result;
use crate::models::Document;
use crate::models::Metadata;

/// Default number of vectors per upsert request
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;

/// One nearest-neighbour hit as reported by the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Read/write access to a similarity-search index.
///
/// `query` is read-only and safe to call concurrently.
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
    /// Return at most `top_k` matches, sorted by descending similarity
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>>;

    /// Insert or replace documents; returns the number written
    async fn upsert(&self, documents: &[Document]) -> Result<usize>;

    /// Vector dimension the index was created with, when known
    fn dimension(&self) -> Option<usize>;

    fn index_name(&self) -> &str;
}

/// Normalize and upsert documents in batches of `batch_size`
pub async fn upsert_in_batches(
    index: &dyn VectorIndexClient,
    documents: Vec<Document>,
    batch_size: usize,
) -> Result<usize> {
    if batch_size == 0 {
        return Err(PostRagError::InvalidConfiguration(
            "upsert batch size must be positive".to_string(),
        ));
    }

    let documents: Vec<Document> = documents.into_iter().map(Document::normalized).collect();
    let mut written = 0;
    for (batch_no, batch) in documents.chunks(batch_size).enumerate() {
        written += index.upsert(batch).await?;
        info!(
            "Upserted batch {} ({} vectors) into '{}'",
            batch_no + 1,
            batch.len(),
            index.index_name()
        );
    }
    Ok(written)
}

/// Check an index dimension against the encoder's
pub fn ensure_dimension(index: &dyn VectorIndexClient, encoder_dimension: usize) -> Result<()> {
    match index.dimension() {
        Some(dim) if dim != encoder_dimension => Err(PostRagError::InvalidConfiguration(format!(
            "index '{}' has dimension {dim} but the encoder produces {encoder_dimension}",
            index.index_name()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(id: &str, title: &str) -> Document {
        Document {
            id: id.to_string(),
            embedding: vec![1.0, 0.0],
            metadata: json!({ "title": title, "score": "3" })
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_upsert_in_batches_normalizes_and_counts() {
        let index = InMemoryIndex::new("posts", 2);
        let docs = (0..5).map(|i| doc(&i.to_string(), "none")).collect();

        let written = upsert_in_batches(&index, docs, 2).await.unwrap();
        assert_eq!(written, 5);
        assert_eq!(index.len().await, 5);

        let hits = index.query(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].metadata["title"], json!(""));
        assert_eq!(hits[0].metadata["score"], json!(3.0));
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let index = InMemoryIndex::new("posts", 2);
        let result = upsert_in_batches(&index, vec![doc("1", "t")], 0).await;
        assert!(matches!(result, Err(PostRagError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_ensure_dimension() {
        let index = InMemoryIndex::new("posts", 384);
        assert!(ensure_dimension(&index, 384).is_ok());
        assert!(matches!(
            ensure_dimension(&index, 1536),
            Err(PostRagError::InvalidConfiguration(_))
        ));
    }
}
