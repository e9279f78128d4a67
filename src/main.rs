use clap::Parser;
use postrag::cli::handlers::EvalOverrides;
use postrag::cli::output::failure_hint;
use postrag::cli::output::print_error;
use postrag::cli::output::print_warning;
use postrag::cli::Cli;
use postrag::cli::Commands;
use postrag::config::AppConfig;
use postrag::Result;
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        print_error(&format!("Error: {e}"));
        if let Some(hint) = failure_hint(&e) {
            print_warning(hint);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    let _log_guard = if cli.verbose {
        postrag::logging::init_logging_with_level("debug")?
    } else {
        postrag::logging::init_logging_with_config(Some(&config))?
    };

    let verbose = cli.verbose;
    match cli.command {
        Commands::Ask { question, sources } => {
            postrag::cli::handle_ask(&config, &question, sources).await
        }
        Commands::Search {
            query,
            save,
            save_retrieved,
        } => {
            postrag::cli::handle_search(
                &config,
                &query,
                save.as_deref(),
                save_retrieved.as_deref(),
                verbose,
            )
            .await
        }
        Commands::Retrieve { query, top_k, save } => {
            postrag::cli::handle_retrieve(&config, &query, top_k, save.as_deref(), verbose).await
        }
        Commands::Rerank {
            query,
            from,
            top_k,
            save,
        } => {
            postrag::cli::handle_rerank(&config, &query, &from, top_k, save.as_deref(), verbose)
                .await
        }
        Commands::Summarize { query } => postrag::cli::handle_summarize(&config, &query).await,
        Commands::Eval {
            input,
            output,
            max_queries,
            timeout,
            parallel,
        } => {
            let overrides = EvalOverrides {
                max_queries,
                timeout_secs: timeout,
                parallelism: parallel,
            };
            postrag::cli::handle_eval(&config, &input, &output, overrides).await
        }
        Commands::Ingest { path, batch_size } => {
            postrag::cli::handle_ingest(&config, &path, batch_size).await
        }
        Commands::Config => postrag::cli::handle_config_command(&config),
    }
}
