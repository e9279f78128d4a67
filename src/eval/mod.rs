//! Evaluation harness
//!
//! Runs a question set through search and generation with a per-query timeout
//! and records the answer, keyword precision, latency and any stage error.

pub mod dataset;

use std::time::Duration;
use std::time::Instant;

use chrono::DateTime;
use chrono::Utc;
use futures::stream;
use futures::stream::StreamExt;
use serde::Serialize;
use tracing::info;
use tracing::warn;

pub use dataset::load_cases;
pub use dataset::write_records;
pub use dataset::EvalCase;
pub use dataset::EvalRecord;

use crate::config::EvalConfig;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::rag::RagService;

/// Share of `expected_keywords` found in `answer` (case-insensitive substring).
///
/// `None` when there are no keywords to check.
#[must_use]
pub fn keyword_precision(answer: &str, expected_keywords: &[String]) -> Option<f64> {
    if expected_keywords.is_empty() {
        return None;
    }
    let answer = answer.to_lowercase();
    let hits = expected_keywords
        .iter()
        .filter(|kw| answer.contains(&kw.to_lowercase()))
        .count();
    Some(hits as f64 / expected_keywords.len() as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    pub timeout_per_query: Duration,
    /// 1 runs strictly sequentially
    pub parallelism: usize,
    pub max_queries: Option<usize>,
}

impl From<&EvalConfig> for EvalOptions {
    fn from(config: &EvalConfig) -> Self {
        Self {
            timeout_per_query: Duration::from_secs(config.timeout_per_query_secs),
            parallelism: config.parallelism,
            max_queries: config.max_queries,
        }
    }
}

/// Aggregate view over a results table
#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub grounded: usize,
    pub failed: usize,
    pub mean_precision: Option<f64>,
    pub mean_latency_sec: f64,
}

impl EvalSummary {
    #[must_use]
    pub fn from_records(started_at: DateTime<Utc>, records: &[EvalRecord]) -> Self {
        let precisions: Vec<f64> = records.iter().filter_map(|r| r.precision).collect();
        let mean_precision = if precisions.is_empty() {
            None
        } else {
            Some(precisions.iter().sum::<f64>() / precisions.len() as f64)
        };
        let mean_latency_sec = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.latency_sec).sum::<f64>() / records.len() as f64
        };

        Self {
            started_at,
            total: records.len(),
            grounded: records.iter().filter(|r| r.grounded).count(),
            failed: records.iter().filter(|r| r.failed()).count(),
            mean_precision,
            mean_latency_sec,
        }
    }
}

/// Drives a [`RagService`] over a question set
pub struct Evaluator<'a> {
    service: &'a RagService,
    options: EvalOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(service: &'a RagService, options: EvalOptions) -> Result<Self> {
        if options.parallelism == 0 {
            return Err(PostRagError::InvalidConfiguration(
                "eval parallelism must be at least 1".to_string(),
            ));
        }
        if options.timeout_per_query.is_zero() {
            return Err(PostRagError::InvalidConfiguration(
                "eval timeout_per_query must be positive".to_string(),
            ));
        }
        Ok(Self { service, options })
    }

    /// Evaluate every case; results keep input order
    pub async fn run(&self, cases: &[EvalCase]) -> Vec<EvalRecord> {
        let limit = self.options.max_queries.unwrap_or(cases.len());
        let cases = &cases[..limit.min(cases.len())];
        let total = cases.len();
        info!(
            "Evaluating {} questions (parallelism={}, timeout={:?})",
            total, self.options.parallelism, self.options.timeout_per_query
        );

        stream::iter(cases.iter().enumerate())
            .map(|(idx, case)| async move {
                info!("Evaluating row {}/{}...", idx + 1, total);
                self.evaluate(case).await
            })
            .buffered(self.options.parallelism)
            .collect()
            .await
    }

    /// Evaluate one case; stage failures are recorded, never propagated
    pub async fn evaluate(&self, case: &EvalCase) -> EvalRecord {
        let started = Instant::now();
        let timeout = self.options.timeout_per_query;

        let mut search_error = None;
        let mut generate_error = None;
        let mut answer_text = String::new();
        let mut grounded = false;

        let sources = match tokio::time::timeout(
            timeout,
            self.service.pipeline().search(&case.question),
        )
        .await
        {
            Ok(Ok(sources)) => Some(sources),
            Ok(Err(e)) => {
                search_error = Some(format!("error: {e}"));
                None
            }
            Err(_) => {
                search_error = Some(format!("timeout after {}s", timeout.as_secs_f64()));
                None
            }
        };

        if let Some(sources) = sources {
            let generation = self.service.generator().answer(
                &case.question,
                &sources,
                self.service.max_context_docs(),
            );
            match tokio::time::timeout(timeout, generation).await {
                Ok(Ok(answer)) => {
                    answer_text = answer.text;
                    grounded = answer.grounded;
                }
                Ok(Err(e)) => generate_error = Some(format!("error: {e}")),
                Err(_) => {
                    generate_error = Some(format!("timeout after {}s", timeout.as_secs_f64()));
                }
            }
        }

        if let Some(error) = search_error.as_ref().or(generate_error.as_ref()) {
            warn!("Question '{}' failed: {}", case.question, error);
        }

        let latency_sec = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        EvalRecord {
            question: case.question.clone(),
            expected_keywords: case.expected_keywords.clone(),
            precision: keyword_precision(&answer_text, &case.expected_keywords),
            answer: answer_text,
            grounded,
            latency_sec,
            search_error,
            generate_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_keyword_precision() {
        let expected = keywords(&["course", "python", "gpu"]);
        let precision = keyword_precision("Take a Python COURSE first.", &expected).unwrap();
        assert!((precision - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_precision_without_keywords() {
        assert_eq!(keyword_precision("anything", &[]), None);
        assert_eq!(keyword_precision("", &keywords(&["x"])), Some(0.0));
    }

    #[test]
    fn test_summary_aggregates() {
        let record = |precision, latency, grounded, failed: bool| EvalRecord {
            question: "q".to_string(),
            expected_keywords: Vec::new(),
            answer: String::new(),
            grounded,
            precision,
            latency_sec: latency,
            search_error: failed.then(|| "timeout after 20s".to_string()),
            generate_error: None,
        };
        let records = vec![
            record(Some(1.0), 1.0, true, false),
            record(Some(0.0), 3.0, false, false),
            record(None, 2.0, false, true),
        ];

        let summary = EvalSummary::from_records(Utc::now(), &records);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.grounded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.mean_precision, Some(0.5));
        assert!((summary.mean_latency_sec - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_options_from_config() {
        let options = EvalOptions::from(&EvalConfig::default());
        assert_eq!(options.timeout_per_query, Duration::from_secs(20));
        assert_eq!(options.parallelism, 1);
    }
}
