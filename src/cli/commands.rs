//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "postrag")]
#[command(about = "Question answering over indexed Reddit posts: retrieve, rerank, answer")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question from the indexed posts
    Ask {
        /// The question
        question: String,
        /// Show the posts the answer was built from
        #[arg(long)]
        sources: bool,
    },
    /// Retrieve and rerank posts without generating an answer
    Search {
        /// Search query
        query: String,
        /// Save the reranked results as a snapshot
        #[arg(long)]
        save: Option<PathBuf>,
        /// Save the retrieval-stage candidates as a snapshot
        #[arg(long)]
        save_retrieved: Option<PathBuf>,
    },
    /// Coarse vector retrieval only
    Retrieve {
        /// Search query
        query: String,
        /// Number of candidates (default: search.top_k_retrieve)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Save the candidates as a snapshot
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Rerank a saved retrieval snapshot
    Rerank {
        /// Query the snapshot was retrieved for
        query: String,
        /// Snapshot written by `retrieve --save`
        #[arg(long = "from")]
        from: PathBuf,
        /// Number of results (default: search.top_k_rerank)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Save the reranked results as a snapshot
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Summarize the posts most relevant to a query
    Summarize {
        /// Search query
        query: String,
    },
    /// Run a question set and write a results table
    Eval {
        /// Question set (JSON Lines with question and expected_keywords)
        #[arg(short, long, default_value = "data/eval/eval_set.jsonl")]
        input: PathBuf,
        /// Results table
        #[arg(short, long, default_value = "data/eval/eval_results.jsonl")]
        output: PathBuf,
        /// Evaluate only the first N questions
        #[arg(long)]
        max_queries: Option<usize>,
        /// Per-query timeout in seconds (default: eval.timeout_per_query_secs)
        #[arg(long)]
        timeout: Option<u64>,
        /// Number of questions evaluated concurrently (default: eval.parallelism)
        #[arg(long)]
        parallel: Option<usize>,
    },
    /// Upsert pre-embedded documents (JSON Lines of {id, embedding, metadata})
    Ingest {
        /// Input file
        path: PathBuf,
        /// Vectors per upsert request (default: index.upsert_batch_size)
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Show current configuration
    Config,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "postrag",
            "ask",
            "How to learn GenAI?",
            "--verbose",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Ask { .. }));
    }

    #[test]
    fn test_parse_rerank_from_snapshot() {
        let cli = Cli::try_parse_from([
            "postrag",
            "rerank",
            "q",
            "--from",
            "data/retrieved/query_results.jsonl",
            "-k",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Rerank { from, top_k, .. } => {
                assert_eq!(from, PathBuf::from("data/retrieved/query_results.jsonl"));
                assert_eq!(top_k, Some(3));
            }
            _ => panic!("expected rerank"),
        }
    }
}
