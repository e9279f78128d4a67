//! In-process vector index with exact cosine search

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::IndexMatch;
use super::VectorIndexClient;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::models::Document;

/// Exact nearest-neighbour search over documents held in memory.
///
/// Ties keep insertion order, so results are reproducible for a fixed corpus.
pub struct InMemoryIndex {
    name: String,
    dimension: usize,
    documents: RwLock<Vec<Document>>,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Build an index pre-populated with `documents` (metadata stored as given)
    pub fn with_documents(
        name: impl Into<String>,
        dimension: usize,
        documents: Vec<Document>,
    ) -> Result<Self> {
        for doc in &documents {
            check_dimension(dimension, doc.embedding.len())?;
        }
        Ok(Self {
            name: name.into(),
            dimension,
            documents: RwLock::new(documents),
        })
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PostRagError::EmbeddingDimensionMismatch { expected, actual })
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndexClient for InMemoryIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        check_dimension(self.dimension, vector.len())?;

        let documents = self.documents.read().await;
        let mut scored: Vec<(f32, &Document)> = documents
            .iter()
            .map(|doc| (cosine_similarity(vector, &doc.embedding), doc))
            .collect();

        // Vec::sort_by is stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let matches: Vec<IndexMatch> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, doc)| IndexMatch {
                id: doc.id.clone(),
                score,
                metadata: doc.metadata.clone(),
            })
            .collect();

        debug!("In-memory query on '{}' returned {} matches", self.name, matches.len());
        Ok(matches)
    }

    async fn upsert(&self, documents: &[Document]) -> Result<usize> {
        for doc in documents {
            check_dimension(self.dimension, doc.embedding.len())?;
        }

        let mut stored = self.documents.write().await;
        for doc in documents {
            match stored.iter_mut().find(|existing| existing.id == doc.id) {
                Some(existing) => *existing = doc.clone(),
                None => stored.push(doc.clone()),
            }
        }
        Ok(documents.len())
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn index_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;

    fn doc(id: &str, embedding: Vec<f32>) -> Document {
        Document {
            id: id.to_string(),
            embedding,
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let index = InMemoryIndex::with_documents(
            "posts",
            2,
            vec![
                doc("far", vec![0.0, 1.0]),
                doc("near", vec![1.0, 0.0]),
                doc("mid", vec![1.0, 1.0]),
            ],
        )
        .unwrap();

        let hits = index.query(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_top_k_truncates_and_small_index_returns_fewer() {
        let index = InMemoryIndex::with_documents(
            "posts",
            2,
            vec![doc("a", vec![1.0, 0.0]), doc("b", vec![0.5, 0.5])],
        )
        .unwrap();

        assert_eq!(index.query(&[1.0, 0.0], 1).await.unwrap().len(), 1);
        assert_eq!(index.query(&[1.0, 0.0], 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let index = InMemoryIndex::with_documents(
            "posts",
            2,
            vec![
                doc("first", vec![1.0, 0.0]),
                doc("second", vec![2.0, 0.0]),
                doc("third", vec![3.0, 0.0]),
            ],
        )
        .unwrap();

        let hits = index.query(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_id() {
        let index = InMemoryIndex::new("posts", 2);
        index.upsert(&[doc("a", vec![1.0, 0.0])]).await.unwrap();
        index.upsert(&[doc("a", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(index.len().await, 1);
        let hits = index.query(&[0.0, 1.0], 1).await.unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_wrong_dimension_rejected() {
        let index = InMemoryIndex::new("posts", 3);
        assert!(index.upsert(&[doc("a", vec![1.0])]).await.is_err());
        assert!(matches!(
            index.query(&[1.0, 0.0], 1).await,
            Err(PostRagError::EmbeddingDimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = InMemoryIndex::new("posts", 2);
        assert!(index.is_empty().await);
        assert!(index.query(&[1.0, 0.0], 5).await.unwrap().is_empty());
    }
}
