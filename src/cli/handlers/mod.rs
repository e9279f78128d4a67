//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - rag: grounded answers and summaries
//! - search: retrieval, reranking and snapshots
//! - eval: question-set evaluation
//! - ingest: loading pre-embedded documents into the index
//! - info: configuration display

pub mod eval;
pub mod info;
pub mod ingest;
pub mod rag;
pub mod search;

use std::sync::Arc;

pub use eval::*;
pub use info::*;
pub use ingest::*;
pub use rag::*;
pub use search::*;

use crate::config::AppConfig;
use crate::embeddings::EmbeddingService;
use crate::index::PineconeIndex;
use crate::rag::Retriever;
use crate::Result;

/// Encoder + remote index, as configured
pub(crate) async fn build_retriever(config: &AppConfig) -> Result<Retriever> {
    let encoder = Arc::new(EmbeddingService::new(config)?);
    let index = Arc::new(PineconeIndex::connect(&config.index).await?);
    Retriever::new(encoder, index, config.index_timeout())
}
