/// Ingestion: search → fetch each paper → chunk → store.
///
/// A paper whose text cannot be obtained is skipped and counted; the run goes
/// on. Failures of the search or of the vector index abort the phase.
use tracing::{debug, info, warn};

use crate::chunking::{split_with_overlap, truncate_chars};
use crate::config::Config;
use crate::error::{PhaseError, ToolError};
use crate::mcp::{McpManager, ServerName};
use crate::models::{ChunkMetadata, ChunkRecord, PaperRecord};
use crate::tools::arxiv::{self, SearchResults};
use crate::tools::{PaperStore, VectorIndex, WebScraper, firecrawl};

/// Counts reported when the phase finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub papers_found: usize,
    pub papers_processed: usize,
    pub papers_skipped: usize,
    pub chunks_stored: usize,
}

pub struct IngestionPipeline<'a> {
    mcp: &'a McpManager,
    config: &'a Config,
}

impl<'a> IngestionPipeline<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager, config: &'a Config) -> Self {
        Self { mcp, config }
    }

    pub async fn run(&self) -> Result<IngestReport, PhaseError> {
        let mut report = IngestReport::default();

        info!("Searching arXiv for: {}", self.config.search_topic);
        let SearchResults { mut papers, malformed } = PaperStore::new(self.mcp)
            .search(
                &self.config.search_topic,
                self.config.categories.as_deref(),
                self.config.max_papers,
            )
            .await?;
        papers.truncate(self.config.max_papers);
        let malformed = malformed.min(self.config.max_papers - papers.len());
        report.papers_found = papers.len() + malformed;
        report.papers_skipped = malformed;
        info!("Found {} papers", report.papers_found);
        if malformed > 0 {
            warn!("Skipping {malformed} unreadable search results");
        }

        if papers.is_empty() {
            warn!("No papers found, nothing to ingest");
            return Ok(report);
        }

        let index = VectorIndex::new(self.mcp, &self.config.index);
        let mut index_ready = false;
        let total = papers.len();

        for (i, paper) in papers.iter().enumerate() {
            info!(
                "Processing paper {}/{total}: {}",
                i + 1,
                truncate_chars(&paper.title, 60)
            );

            let records = match self.prepare(paper).await {
                Ok(records) => records,
                Err(reason) => {
                    warn!("Skipping paper {:?}: {reason}", paper.id);
                    report.papers_skipped += 1;
                    continue;
                }
            };

            if !index_ready {
                index.ensure_index().await?;
                index_ready = true;
            }

            let stored = index.upsert(&records).await?;
            info!("Stored {stored} chunks for {}", paper.id);
            report.papers_processed += 1;
            report.chunks_stored += stored;
        }

        info!(
            "Ingestion finished: {} processed, {} skipped, {} chunks stored",
            report.papers_processed, report.papers_skipped, report.chunks_stored
        );
        Ok(report)
    }

    /// Fetch and chunk one paper. Any error here only skips the paper.
    async fn prepare(&self, paper: &PaperRecord) -> Result<Vec<ChunkRecord>, ToolError> {
        if paper.id.trim().is_empty() {
            return Err(ToolError::Decode {
                server: ServerName::Arxiv,
                operation: arxiv::SEARCH_PAPERS.to_string(),
                message: format!("paper {:?} has no id", paper.title),
            });
        }

        let text = self.fetch_text(paper).await?;
        let chunks = split_with_overlap(
            &text,
            self.config.chunking.size,
            self.config.chunking.overlap,
        );
        debug!("{} split into {} chunks", paper.id, chunks.len());

        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| ChunkRecord {
                id: ChunkRecord::record_id(&paper.id, chunk_index),
                text,
                metadata: ChunkMetadata {
                    paper_id: paper.id.clone(),
                    title: paper.title.clone(),
                    authors: paper.authors.clone(),
                    chunk_index,
                    source_url: paper.url.clone(),
                },
            })
            .collect())
    }

    /// Full text from the paper store, falling back to scraping the paper's URL.
    async fn fetch_text(&self, paper: &PaperRecord) -> Result<String, ToolError> {
        let store = PaperStore::new(self.mcp);
        if let Err(e) = store.download(&paper.id).await {
            warn!("Download warning for {}: {e}", paper.id);
        }

        let read_err = match store.read(&paper.id).await {
            Ok(text) if !text.trim().is_empty() => return Ok(text),
            Ok(_) => no_text(ServerName::Arxiv, arxiv::READ_PAPER),
            Err(e) => e,
        };

        let Some(url) = paper.url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Err(read_err);
        };
        debug!("Reading {} failed ({read_err}), scraping {url}", paper.id);

        match WebScraper::new(self.mcp).scrape(url).await {
            Ok(text) if !text.trim().is_empty() => Ok(text),
            Ok(_) => Err(no_text(ServerName::Firecrawl, firecrawl::SCRAPE)),
            Err(e) => Err(e),
        }
    }
}

fn no_text(server: ServerName, operation: &str) -> ToolError {
    ToolError::Decode {
        server,
        operation: operation.to_string(),
        message: "no text content".to_string(),
    }
}
