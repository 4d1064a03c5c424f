/// Phase driver: connect the tool servers, run the selected phases in order,
/// and always tear the servers down afterwards.
use tracing::{info, warn};

use crate::config::{Config, Phase};
use crate::error::AgentError;
use crate::llm::Generator;
use crate::mcp::{McpManager, ServerLauncher, server_specs};
use crate::phases::{IngestReport, IngestionPipeline, QueryOutcome, QueryPipeline};

/// Results of the phases that ran.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub ingestion: Option<IngestReport>,
    pub query: Option<QueryOutcome>,
}

/// Run the configured phases. Ctrl-C aborts the run.
pub async fn run(
    config: &Config,
    launcher: &dyn ServerLauncher,
    generator: &dyn Generator,
) -> Result<RunSummary, AgentError> {
    run_until(config, launcher, generator, wait_for_interrupt()).await
}

/// Like [`run`], but aborts when `interrupt` resolves. Servers are stopped
/// either way.
pub async fn run_until(
    config: &Config,
    launcher: &dyn ServerLauncher,
    generator: &dyn Generator,
    interrupt: impl Future<Output = ()>,
) -> Result<RunSummary, AgentError> {
    let specs = server_specs(config);
    let mcp = McpManager::connect(&specs, launcher, &config.timeouts)
        .await
        .map_err(AgentError::Startup)?;
    info!("All MCP servers connected");

    let result = tokio::select! {
        result = run_phases(config, &mcp, generator) => result,
        () = interrupt => {
            warn!("Interrupted, shutting down");
            Err(AgentError::Interrupted)
        }
    };

    mcp.shutdown().await;
    info!("All connections closed");
    result
}

async fn run_phases(
    config: &Config,
    mcp: &McpManager,
    generator: &dyn Generator,
) -> Result<RunSummary, AgentError> {
    let mut summary = RunSummary::default();

    if config.phase.includes_ingestion() {
        info!("Starting phase 1: ingestion");
        let report = IngestionPipeline::new(mcp, config)
            .run()
            .await
            .map_err(AgentError::in_phase(Phase::Ingestion))?;
        info!("Phase 1 complete");
        summary.ingestion = Some(report);
    }

    if config.phase.includes_query() {
        info!("Starting phase 2: query");
        let outcome = QueryPipeline::new(mcp, config, generator)
            .run(&config.user_query)
            .await
            .map_err(AgentError::in_phase(Phase::Query))?;
        info!("Phase 2 complete, answer saved to {}", outcome.answer_path);
        summary.query = Some(outcome);
    }

    Ok(summary)
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
