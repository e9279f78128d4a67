//! RAG (Retrieval-Augmented Generation) handlers

use crate::cli::output::print_answer;
use crate::cli::output::print_info;
use crate::cli::output::print_reranked;
use crate::config::AppConfig;
use crate::rag::RagService;
use crate::Result;

pub async fn handle_ask(config: &AppConfig, question: &str, show_sources: bool) -> Result<()> {
    print_info(&format!("🤖 Question: \"{question}\""));

    let service = RagService::new(config).await?;
    let response = service.query(question).await?;

    print_answer(&response.answer);
    if show_sources {
        println!();
        print_reranked(&response.sources, true);
    } else {
        println!("\n💡 Use --sources to see the posts behind this answer");
    }
    Ok(())
}

pub async fn handle_summarize(config: &AppConfig, query: &str) -> Result<()> {
    print_info(&format!("📚 Summarizing posts about \"{query}\""));

    let service = RagService::new(config).await?;
    let response = service.summarize(query).await?;

    print_answer(&response.answer);
    println!();
    print_reranked(&response.sources, false);
    Ok(())
}
