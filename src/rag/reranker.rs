//! Cross-encoder reranking of retrieval candidates

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::RerankerConfig;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::rag::Candidate;
use crate::rag::RerankedCandidate;

/// Pairwise relevance scoring backend.
///
/// Must return exactly one score per `(query, passage)` pair, in input order.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    async fn predict(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Client for a cross-encoder sidecar exposing `POST /predict`
pub struct HttpCrossEncoder {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    model: &'a str,
    pairs: Vec<[&'a str; 2]>,
}

#[derive(Deserialize)]
struct PredictResponse {
    scores: Vec<f32>,
}

impl HttpCrossEncoder {
    pub fn new(config: &RerankerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                PostRagError::RerankModelUnavailable(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn predict(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>> {
        let request = PredictRequest {
            model: &self.model,
            pairs: pairs.iter().map(|(q, p)| [*q, *p]).collect(),
        };

        let response = self
            .client
            .post(format!("{}/predict", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| PostRagError::RerankModelUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PostRagError::RerankModelUnavailable(format!(
                "cross-encoder error ({status}): {error_text}"
            )));
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| {
            PostRagError::RerankModelUnavailable(format!("Failed to parse response: {e}"))
        })?;
        Ok(parsed.scores)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Descending by score, NaN after every finite score
fn by_relevance_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Second-stage reranker
pub struct CrossEncoderReranker {
    model: Arc<dyn CrossEncoder>,
    timeout: Duration,
}

impl CrossEncoderReranker {
    #[must_use]
    pub fn new(model: Arc<dyn CrossEncoder>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn from_config(config: &RerankerConfig) -> Result<Self> {
        let model = Arc::new(HttpCrossEncoder::new(config)?);
        Ok(Self::new(model, Duration::from_secs(config.timeout_secs)))
    }

    /// Score every candidate against `query`, reorder and keep the best `top_k`.
    ///
    /// Ties keep retrieval order. Any backend failure is surfaced as
    /// `RerankModelUnavailable`; there is no fallback to retrieval order.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: &[Candidate],
        top_k: usize,
    ) -> Result<Vec<RerankedCandidate>> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let pairs: Vec<(&str, &str)> = candidates
            .iter()
            .map(|c| (query, c.body_text()))
            .collect();
        debug!(
            "Scoring {} pairs with {}",
            pairs.len(),
            self.model.model_name()
        );

        let scores = tokio::time::timeout(self.timeout, self.model.predict(&pairs))
            .await
            .map_err(|_| {
                PostRagError::RerankModelUnavailable(format!(
                    "scoring timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| match e {
                PostRagError::RerankModelUnavailable(_) => e,
                other => PostRagError::RerankModelUnavailable(other.to_string()),
            })?;

        if scores.len() != candidates.len() {
            return Err(PostRagError::RerankModelUnavailable(format!(
                "expected {} scores, got {}",
                candidates.len(),
                scores.len()
            )));
        }

        let mut reranked: Vec<RerankedCandidate> = candidates
            .iter()
            .cloned()
            .zip(scores)
            .map(|(candidate, relevance_score)| RerankedCandidate {
                candidate,
                relevance_score,
            })
            .collect();

        // sort_by is stable
        reranked.sort_by(|a, b| by_relevance_desc(a.relevance_score, b.relevance_score));
        reranked.truncate(top_k);

        info!(
            "Reranked {} candidates, kept {}",
            candidates.len(),
            reranked.len()
        );
        Ok(reranked)
    }
}
