//! Evaluation handler

use std::path::Path;

use chrono::Utc;

use crate::cli::output::print_eval_summary;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::config::AppConfig;
use crate::eval::load_cases;
use crate::eval::write_records;
use crate::eval::EvalOptions;
use crate::eval::EvalSummary;
use crate::eval::Evaluator;
use crate::rag::RagService;
use crate::Result;

/// Command-line overrides for the `[eval]` config section
pub struct EvalOverrides {
    pub max_queries: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub parallelism: Option<usize>,
}

pub async fn handle_eval(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    overrides: EvalOverrides,
) -> Result<()> {
    let mut options = EvalOptions::from(&config.eval);
    if let Some(max_queries) = overrides.max_queries {
        options.max_queries = Some(max_queries);
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        options.timeout_per_query = std::time::Duration::from_secs(timeout_secs);
    }
    if let Some(parallelism) = overrides.parallelism {
        options.parallelism = parallelism;
    }

    let cases = load_cases(input)?;
    print_info(&format!(
        "🧪 Loaded {} questions from {}",
        cases.len(),
        input.display()
    ));

    let service = RagService::new(config).await?;
    let evaluator = Evaluator::new(&service, options)?;

    let started_at = Utc::now();
    let records = evaluator.run(&cases).await;
    write_records(output, &records)?;
    print_success(&format!("Saved eval results to {}", output.display()));

    print_eval_summary(&EvalSummary::from_records(started_at, &records));
    Ok(())
}
