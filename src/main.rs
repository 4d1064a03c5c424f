use anyhow::{Context, Result};
use arxiv_rag_agent::config::{Config, Phase};
use arxiv_rag_agent::llm::OpenAiGenerator;
use arxiv_rag_agent::mcp::StdioLauncher;
use arxiv_rag_agent::{logging, runner};
use clap::Parser;
use tracing::info;

/// Search and ingest arXiv papers, then answer a question from them.
///
/// Everything is configured through environment variables (a `.env` file is
/// honoured); the flags below only override them.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Which phase(s) to run. Overrides PHASE.
    #[arg(long, value_enum)]
    phase: Option<Phase>,

    /// Question for the query phase. Overrides USER_QUERY.
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // 1. Load config (fails before any server is started)
    let mut overrides = Vec::new();
    if let Some(phase) = cli.phase {
        overrides.push(("PHASE", phase.as_str().to_string()));
    }
    if let Some(query) = cli.query {
        overrides.push(("USER_QUERY", query));
    }
    let config = Config::from_env_with(&overrides).context("failed to load configuration")?;
    config
        .ensure_dirs()
        .context("failed to create working directories")?;

    // 2. Logging
    logging::init(&config.paths.logs_dir);
    info!("Starting arXiv RAG agent v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    // 3. Collaborators
    let launcher = StdioLauncher::new(config.timeouts.server_start);
    let generator = OpenAiGenerator::new(&config).context("failed to build LLM client")?;

    // 4. Run
    let summary = runner::run(&config, &launcher, &generator).await?;

    if let Some(report) = &summary.ingestion {
        info!(
            "Ingestion: {} papers processed, {} skipped, {} chunks stored",
            report.papers_processed, report.papers_skipped, report.chunks_stored
        );
    }
    if let Some(outcome) = &summary.query {
        println!("{}", outcome.answer);
    }

    Ok(())
}
