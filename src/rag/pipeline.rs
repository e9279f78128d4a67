//! Complete RAG pipeline: Retrieve -> Rerank -> Generate

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::SearchConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::index::PineconeIndex;
use crate::rag::Answer;
use crate::rag::AnswerGenerator;
use crate::rag::Candidate;
use crate::rag::CrossEncoderReranker;
use crate::rag::GenerationConfig;
use crate::rag::Query;
use crate::rag::RerankedCandidate;
use crate::rag::Retriever;

/// Top-k policy for the two search stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub top_k_retrieve: usize,
    pub top_k_rerank: usize,
}

impl PipelineConfig {
    /// Both values positive and `top_k_rerank <= top_k_retrieve`
    pub fn validate(&self) -> Result<()> {
        if self.top_k_retrieve == 0 || self.top_k_rerank == 0 {
            return Err(PostRagError::InvalidConfiguration(format!(
                "top_k_retrieve ({}) and top_k_rerank ({}) must be positive",
                self.top_k_retrieve, self.top_k_rerank
            )));
        }
        if self.top_k_rerank > self.top_k_retrieve {
            return Err(PostRagError::InvalidConfiguration(format!(
                "top_k_rerank ({}) cannot exceed top_k_retrieve ({})",
                self.top_k_rerank, self.top_k_retrieve
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k_retrieve: 50,
            top_k_rerank: 5,
        }
    }
}

impl From<&SearchConfig> for PipelineConfig {
    fn from(search: &SearchConfig) -> Self {
        Self {
            top_k_retrieve: search.top_k_retrieve,
            top_k_rerank: search.top_k_rerank,
        }
    }
}

/// Both stages of one search call
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub retrieved: Vec<Candidate>,
    pub reranked: Vec<RerankedCandidate>,
}

/// Two-stage search: coarse retrieval then cross-encoder reranking
pub struct SearchPipeline {
    retriever: Retriever,
    reranker: CrossEncoderReranker,
    config: PipelineConfig,
}

impl SearchPipeline {
    /// Fails with `InvalidConfiguration` when the top-k policy is inconsistent
    pub fn new(
        retriever: Retriever,
        reranker: CrossEncoderReranker,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            retriever,
            reranker,
            config,
        })
    }

    /// Reranked top-`top_k_rerank` documents for `query`
    pub async fn search(&self, query: &str) -> Result<Vec<RerankedCandidate>> {
        Ok(self.search_with_candidates(query).await?.reranked)
    }

    /// Like [`search`](Self::search), also returning the retrieval-stage candidates
    pub async fn search_with_candidates(&self, query: &str) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(PostRagError::InvalidQuery("query is empty".to_string()));
        }
        let query = Query::new(query);

        debug!("Step 1: Retrieving candidates");
        let retrieved = self
            .retriever
            .search(&query, self.config.top_k_retrieve)
            .await?;
        info!(
            "Retrieved {} candidates from '{}'",
            retrieved.len(),
            self.retriever.index_name()
        );

        debug!("Step 2: Reranking");
        let reranked = self
            .reranker
            .rerank(&query.text, &retrieved, self.config.top_k_rerank)
            .await?;

        Ok(SearchOutcome {
            retrieved,
            reranked,
        })
    }

    #[must_use]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[must_use]
    pub const fn reranker(&self) -> &CrossEncoderReranker {
        &self.reranker
    }

    #[must_use]
    pub const fn config(&self) -> PipelineConfig {
        self.config
    }
}

/// Complete RAG service
pub struct RagService {
    pipeline: SearchPipeline,
    generator: AnswerGenerator,
    max_context_docs: usize,
}

impl RagService {
    /// Build every backend from configuration.
    ///
    /// # Errors
    /// - `InvalidConfiguration` for inconsistent top-k values, unknown providers or
    ///   an index whose dimension differs from the encoder's
    /// - `IndexNotFound` / `IndexUnavailable` when the index cannot be described
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let pipeline_config = PipelineConfig::from(&config.search);
        pipeline_config.validate()?;

        let encoder = Arc::new(EmbeddingService::new(config)?);
        let index = Arc::new(PineconeIndex::connect(&config.index).await?);
        let retriever = Retriever::new(encoder, index, config.index_timeout())?;
        let reranker = CrossEncoderReranker::from_config(&config.reranker)?;
        let pipeline = SearchPipeline::new(retriever, reranker, pipeline_config)?;

        let model = crate::llm::from_config(config)?;
        let generator = AnswerGenerator::new(model, GenerationConfig::from_app_config(config)?);

        info!("RAG service ready");
        Self::from_parts(pipeline, generator, config.search.max_context_docs)
    }

    /// Create from existing components
    pub fn from_parts(
        pipeline: SearchPipeline,
        generator: AnswerGenerator,
        max_context_docs: usize,
    ) -> Result<Self> {
        if max_context_docs == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "max_context_docs must be positive".to_string(),
            ));
        }
        Ok(Self {
            pipeline,
            generator,
            max_context_docs,
        })
    }

    /// Search, rerank and answer `query`
    pub async fn query(&self, query: &str) -> Result<RagResponse> {
        info!("Processing RAG query: {}", query);
        let sources = self.pipeline.search(query).await?;

        debug!("Step 3: Generating answer");
        let answer = self
            .generator
            .answer(query, &sources, self.max_context_docs)
            .await?;
        info!("RAG query completed (grounded={})", answer.grounded);

        Ok(RagResponse {
            query: query.to_string(),
            answer,
            sources,
        })
    }

    /// Search and summarize the top documents for `query`
    pub async fn summarize(&self, query: &str) -> Result<RagResponse> {
        let sources = self.pipeline.search(query).await?;
        let answer = self
            .generator
            .summarize(&sources, self.max_context_docs)
            .await?;
        Ok(RagResponse {
            query: query.to_string(),
            answer,
            sources,
        })
    }

    #[must_use]
    pub const fn pipeline(&self) -> &SearchPipeline {
        &self.pipeline
    }

    #[must_use]
    pub const fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    #[must_use]
    pub const fn max_context_docs(&self) -> usize {
        self.max_context_docs
    }
}

/// RAG response
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub query: String,
    pub answer: Answer,
    pub sources: Vec<RerankedCandidate>,
}

impl RagResponse {
    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Query: {}\n\n", self.query));
        output.push_str(&format!("Answer:\n{}\n\n", self.answer.text));
        if !self.answer.grounded {
            output.push_str("(no grounded answer in the retrieved posts)\n\n");
        }
        output.push_str(&format!("Sources ({} posts):\n", self.sources.len()));

        for (idx, source) in self.sources.iter().enumerate() {
            let metadata = source.metadata();
            output.push_str(&format!(
                "  {}. [{}] r/{} {} (relevance: {:.3}, similarity: {:.3})\n",
                idx + 1,
                source.id(),
                metadata.subreddit,
                metadata.title,
                source.relevance_score,
                source.similarity_score()
            ));
        }

        output
    }
}
