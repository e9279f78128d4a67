//! RAG (Retrieval-Augmented Generation) module
//!
//! Two-stage search over indexed posts followed by grounded generation:
//! - Coarse retrieval: query embedding + vector index nearest neighbours
//! - Cross-encoder reranking of the retrieved candidates
//! - Context assembly and LLM answer generation with an explicit
//!   "insufficient context" outcome
//!
//! # Examples
//!
//! ```rust,no_run
//! use postrag::config::AppConfig;
//! use postrag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::new(&config).await?;
//!
//!     let response = service.query("How to learn GenAI?").await?;
//!     println!("Answer: {}", response.answer.text);
//!     println!("Sources: {} posts", response.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod reranker;
pub mod retriever;
pub mod snapshot;

pub use answer::AnswerGenerator;
pub use answer::GenerationConfig;
pub use context::ContextAssembler;
pub use pipeline::PipelineConfig;
pub use pipeline::RagResponse;
pub use pipeline::RagService;
pub use pipeline::SearchOutcome;
pub use pipeline::SearchPipeline;
pub use reranker::CrossEncoder;
pub use reranker::CrossEncoderReranker;
pub use reranker::HttpCrossEncoder;
pub use retriever::Retriever;

use serde::Serialize;

use crate::models::DocumentMetadata;

/// A question as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Retrieval-stage result; lives for one search call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: String,
    pub similarity_score: f32,
    pub metadata: DocumentMetadata,
}

impl Candidate {
    #[must_use]
    pub fn body_text(&self) -> &str {
        &self.metadata.body_text
    }
}

/// Candidate with a cross-encoder relevance score.
///
/// Final ordering uses `relevance_score` only; `similarity_score` on the inner
/// candidate is kept for diagnostics and is not on the same scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankedCandidate {
    pub candidate: Candidate,
    pub relevance_score: f32,
}

impl RerankedCandidate {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    #[must_use]
    pub fn body_text(&self) -> &str {
        self.candidate.body_text()
    }

    #[must_use]
    pub fn similarity_score(&self) -> f32 {
        self.candidate.similarity_score
    }

    #[must_use]
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.candidate.metadata
    }
}

/// Generated answer; `grounded == false` means the context did not support one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub grounded: bool,
}

impl Answer {
    #[must_use]
    pub fn insufficient_context() -> Self {
        Self {
            text: prompts::FALLBACK_ANSWER.to_string(),
            grounded: false,
        }
    }
}
