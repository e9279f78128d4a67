//! Search handlers: retrieval, reranking and result snapshots

use std::path::Path;

use super::build_retriever;
use crate::cli::output::print_candidates;
use crate::cli::output::print_info;
use crate::cli::output::print_reranked;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::config::AppConfig;
use crate::rag::snapshot::read_snapshot;
use crate::rag::snapshot::write_snapshot;
use crate::rag::snapshot::SnapshotRow;
use crate::rag::CrossEncoderReranker;
use crate::rag::PipelineConfig;
use crate::rag::Query;
use crate::rag::SearchPipeline;
use crate::Result;

pub async fn handle_search(
    config: &AppConfig,
    query: &str,
    save: Option<&Path>,
    save_retrieved: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    print_info(&format!("🔍 Searching: \"{query}\""));

    let retriever = build_retriever(config).await?;
    let reranker = CrossEncoderReranker::from_config(&config.reranker)?;
    let pipeline = SearchPipeline::new(retriever, reranker, PipelineConfig::from(&config.search))?;

    let outcome = pipeline.search_with_candidates(query).await?;
    println!(
        "   ✓ Retrieved {} candidates, kept {}",
        outcome.retrieved.len(),
        outcome.reranked.len()
    );
    print_reranked(&outcome.reranked, verbose);

    if let Some(path) = save_retrieved {
        let rows: Vec<SnapshotRow> = outcome.retrieved.iter().map(SnapshotRow::from).collect();
        write_snapshot(path, &rows)?;
        print_success(&format!("Retrieved candidates saved to {}", path.display()));
    }
    if let Some(path) = save {
        let rows: Vec<SnapshotRow> = outcome.reranked.iter().map(SnapshotRow::from).collect();
        write_snapshot(path, &rows)?;
        print_success(&format!("Reranked results saved to {}", path.display()));
    }
    Ok(())
}

pub async fn handle_retrieve(
    config: &AppConfig,
    query: &str,
    top_k: Option<usize>,
    save: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.search.top_k_retrieve);
    print_info(&format!("🔍 Retrieving top {top_k} for \"{query}\""));

    let retriever = build_retriever(config).await?;
    let candidates = retriever.search(&Query::new(query), top_k).await?;
    print_candidates(&candidates, verbose);

    if let Some(path) = save {
        let rows: Vec<SnapshotRow> = candidates.iter().map(SnapshotRow::from).collect();
        write_snapshot(path, &rows)?;
        print_success(&format!("Candidates saved to {}", path.display()));
    }
    Ok(())
}

pub async fn handle_rerank(
    config: &AppConfig,
    query: &str,
    from: &Path,
    top_k: Option<usize>,
    save: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.search.top_k_rerank);
    let candidates: Vec<_> = read_snapshot(from)?
        .into_iter()
        .map(SnapshotRow::into_candidate)
        .collect();
    print_info(&format!(
        "🔀 Reranking {} candidates from {}",
        candidates.len(),
        from.display()
    ));
    if candidates.is_empty() {
        print_warning("Snapshot is empty, nothing to rerank");
        return Ok(());
    }

    let reranker = CrossEncoderReranker::from_config(&config.reranker)?;
    let reranked = reranker.rerank(query, &candidates, top_k).await?;
    print_reranked(&reranked, verbose);

    if let Some(path) = save {
        let rows: Vec<SnapshotRow> = reranked.iter().map(SnapshotRow::from).collect();
        write_snapshot(path, &rows)?;
        print_success(&format!("Reranked results saved to {}", path.display()));
    }
    Ok(())
}
