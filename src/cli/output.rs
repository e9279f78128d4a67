//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `postrag` CLI

use crate::config::AppConfig;
use crate::errors::PostRagError;
use crate::eval::EvalSummary;
use crate::rag::Answer;
use crate::rag::Candidate;
use crate::rag::RerankedCandidate;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// # Arguments
/// * `s` - The string to truncate
/// * `max_chars` - Maximum number of characters (not bytes)
///
/// # Returns
/// Truncated string with "..." suffix if truncated, otherwise the original string
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Collapse newlines so a preview fits on one line
fn one_line(s: &str, max_chars: usize) -> String {
    truncate_str(&s.split_whitespace().collect::<Vec<_>>().join(" "), max_chars)
}

/// Print retrieval-stage candidates
pub fn print_candidates(candidates: &[Candidate], verbose: bool) {
    println!("Found {} candidates:", candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let metadata = &candidate.metadata;
        println!(
            "  {}. [{}] r/{} | similarity: {:.4} | {}",
            idx + 1,
            candidate.id,
            metadata.subreddit,
            candidate.similarity_score,
            one_line(&metadata.title, 80)
        );
        if verbose {
            println!("     {}", one_line(candidate.body_text(), 200));
        }
    }
}

/// Print reranked results
pub fn print_reranked(results: &[RerankedCandidate], verbose: bool) {
    println!("Top {} results:", results.len());
    for (idx, result) in results.iter().enumerate() {
        let metadata = result.metadata();
        println!(
            "  {}. [{}] r/{} | relevance: {:.4} | similarity: {:.4} | {}",
            idx + 1,
            result.id(),
            metadata.subreddit,
            result.relevance_score,
            result.similarity_score(),
            one_line(&metadata.title, 80)
        );
        if verbose {
            println!("     {}", one_line(result.body_text(), 200));
        }
    }
}

pub fn print_answer(answer: &Answer) {
    println!("\n{}", "═".repeat(80));
    println!("📝 Answer:\n");
    println!("{}", answer.text);
    println!("\n{}", "═".repeat(80));
    if !answer.grounded {
        print_warning("The retrieved posts did not contain enough information");
    }
}

pub fn print_eval_summary(summary: &EvalSummary) {
    println!("📊 Evaluation summary (started {}):", summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Questions: {}", summary.total);
    println!("  Grounded answers: {}", summary.grounded);
    println!("  Failed: {}", summary.failed);
    match summary.mean_precision {
        Some(precision) => println!("  Mean keyword precision: {precision:.3}"),
        None => println!("  Mean keyword precision: n/a"),
    }
    println!("  Mean latency: {:.2}s", summary.mean_latency_sec);
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 postrag Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Key: {}", mask_secret(config.embeddings.api_key.as_deref()));
    println!("  Timeout: {}s", config.embeddings.timeout_secs);
    println!();

    println!("🗂️  Index:");
    println!("  Name: {}", config.index.index_name);
    println!(
        "  Host: {}",
        config.index.host.as_deref().unwrap_or("(resolved from control plane)")
    );
    println!("  Namespace: {}", config.index.namespace.as_deref().unwrap_or("(default)"));
    println!("  Key: {}", mask_secret(config.index.api_key.as_deref()));
    println!("  Timeout: {}s", config.index.timeout_secs);
    println!();

    println!("🔀 Reranker:");
    println!("  Endpoint: {}", config.reranker.endpoint);
    println!("  Model: {}", config.reranker.model);
    println!("  Timeout: {}s", config.reranker.timeout_secs);
    println!();

    println!("🔍 Search:");
    println!("  top_k_retrieve: {}", config.search.top_k_retrieve);
    println!("  top_k_rerank: {}", config.search.top_k_rerank);
    println!("  max_context_docs: {}", config.search.max_context_docs);
    println!();

    println!("🤖 LLM:");
    println!("  Provider: {}", config.llm.provider);
    match config.llm_model() {
        Ok(model) => println!("  Model: {model}"),
        Err(e) => println!("  Model: {e}"),
    }
    println!("  OpenAI key: {}", mask_secret(config.llm.openai_api_key.as_deref()));
    println!("  Timeout: {}s", config.llm.timeout_secs);
}

/// Show only the last four characters of a secret
fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        None => "(not set)".to_string(),
        Some(s) if s.chars().count() <= 4 => "****".to_string(),
        Some(s) => {
            let tail: String = s.chars().skip(s.chars().count() - 4).collect();
            format!("****{tail}")
        }
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

/// Next step to suggest when a command fails on an external service
#[must_use]
pub fn failure_hint(error: &PostRagError) -> Option<&'static str> {
    if !error.is_backend_failure() {
        return None;
    }
    Some(match error {
        PostRagError::IndexNotFound(_) => {
            "Check index.index_name, or create the index and run `postrag ingest`"
        }
        PostRagError::EmbeddingDimensionMismatch { .. } => {
            "embeddings.dimension must match the model and the index"
        }
        PostRagError::GenerationTimeout(_) => "Raise llm.timeout_secs or use a smaller model",
        _ => "Check that the configured endpoint is running (`postrag config` shows it)",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_str("short", 10), "short");
    }

    #[test]
    fn test_one_line_collapses_whitespace() {
        assert_eq!(one_line("a\n\nb\tc", 20), "a b c");
    }

    #[test]
    fn test_failure_hint_only_for_backend_errors() {
        assert!(failure_hint(&PostRagError::InvalidQuery("blank".to_string())).is_none());
        assert!(failure_hint(&PostRagError::InvalidConfiguration("x".to_string())).is_none());

        let hint = failure_hint(&PostRagError::IndexNotFound("reddit-genai".to_string()));
        assert!(hint.is_some_and(|h| h.contains("ingest")));
        assert!(failure_hint(&PostRagError::RerankModelUnavailable("down".to_string())).is_some());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(None), "(not set)");
        assert_eq!(mask_secret(Some("abc")), "****");
        assert_eq!(mask_secret(Some("pcsk_123456")), "****3456");
    }
}
