/// Query: retrieve → assemble context → generate → log → write locally.
///
/// Every step is fatal on failure. An empty retrieval is not a failure: the
/// answer becomes [`NO_CONTEXT_ANSWER`], the generator is skipped, and the log
/// record and output files are still written.
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{info, warn};

use crate::chunking::truncate_chars;
use crate::config::Config;
use crate::error::PhaseError;
use crate::llm::Generator;
use crate::mcp::McpManager;
use crate::models::{LogEntry, RetrievedChunk};
use crate::tools::{LocalFiles, QueryLog, VectorIndex};

pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the database to answer your question.";

pub const ANSWER_FILE: &str = "answer.md";
pub const SOURCES_FILE: &str = "sources.md";

/// Characters of each chunk quoted in the log record's sources field.
const EXCERPT_CHARS: usize = 200;

/// What the phase produced.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    /// Whether the generator was called (false when nothing was retrieved).
    pub generated: bool,
    pub retrieved: Vec<RetrievedChunk>,
    pub log_entry: LogEntry,
    pub answer_path: String,
    pub sources_path: Option<String>,
}

pub struct QueryPipeline<'a> {
    mcp: &'a McpManager,
    config: &'a Config,
    generator: &'a dyn Generator,
}

impl<'a> QueryPipeline<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager, config: &'a Config, generator: &'a dyn Generator) -> Self {
        Self {
            mcp,
            config,
            generator,
        }
    }

    pub async fn run(&self, question: &str) -> Result<QueryOutcome, PhaseError> {
        info!("User query: {question}");

        // 1. Retrieve
        let retrieved = VectorIndex::new(self.mcp, &self.config.index)
            .query(question, self.config.top_k)
            .await?;
        info!("Retrieved {} relevant chunks", retrieved.len());

        // 2. Assemble context
        let context = assemble_context(&retrieved, self.config.max_context_chars);

        // 3. Generate
        let (answer, generated) = if context.is_empty() {
            warn!("No relevant context found, skipping generation");
            (NO_CONTEXT_ANSWER.to_string(), false)
        } else {
            let answer = self.generator.generate(question, &context).await?;
            info!("Answer generated ({} chars)", answer.chars().count());
            (answer, true)
        };

        // 4. Log
        let log_entry = LogEntry {
            title: question.to_string(),
            timestamp: Utc::now(),
            answer: answer.clone(),
            sources: format_sources(&retrieved),
        };
        QueryLog::new(self.mcp, &self.config.notion_database_id)
            .create_record(&log_entry)
            .await?;
        info!("Logged interaction");

        // 5. Persist locally
        let files = LocalFiles::new(self.mcp);
        let answer_path = self.output_path(ANSWER_FILE);
        let content = render_answer(
            &log_entry.timestamp,
            &self.config.search_topic,
            question,
            &answer,
        );
        files.write_file(&answer_path, &content).await?;
        info!("Saved answer to {answer_path}");

        let sources_path = if retrieved.is_empty() {
            None
        } else {
            let path = self.output_path(SOURCES_FILE);
            files.write_file(&path, &render_sources(&retrieved)).await?;
            Some(path)
        };

        Ok(QueryOutcome {
            answer,
            generated,
            retrieved,
            log_entry,
            answer_path,
            sources_path,
        })
    }

    fn output_path(&self, file: &str) -> String {
        self.config
            .paths
            .outputs_dir
            .join(file)
            .to_string_lossy()
            .to_string()
    }
}

// ── Formatting ───────────────────────────────────────────────────────

fn source_label(chunk: &RetrievedChunk) -> String {
    match chunk.paper_id() {
        Some(id) => format!("{} ({id}, chunk {})", chunk.title(), chunk.chunk_index()),
        None => format!("{} (chunk {})", chunk.title(), chunk.chunk_index()),
    }
}

fn collapse_whitespace(text: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
    RE.replace_all(text.trim(), " ").into_owned()
}

/// Join retrieved chunks into one context block of at most `max_chars` chars.
///
/// Chunks that do not fit are dropped; the first one is truncated instead, so
/// a non-empty retrieval always yields some context.
pub fn assemble_context(chunks: &[RetrievedChunk], max_chars: usize) -> String {
    const SEPARATOR: &str = "\n\n";
    let mut context = String::new();
    let mut used = 0;

    for chunk in chunks.iter().filter(|c| !c.text.trim().is_empty()) {
        let block = format!("[Source: {}]\n{}", source_label(chunk), chunk.text.trim());
        let block_len = block.chars().count();

        if context.is_empty() {
            let block = truncate_chars(&block, max_chars);
            used = block.chars().count();
            context.push_str(block);
            continue;
        }
        if used + SEPARATOR.len() + block_len > max_chars {
            continue;
        }
        context.push_str(SEPARATOR);
        context.push_str(&block);
        used += SEPARATOR.len() + block_len;
    }

    context
}

/// One line per retrieved chunk: label plus a whitespace-collapsed excerpt.
pub fn format_sources(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            let text = collapse_whitespace(&chunk.text);
            let excerpt = truncate_chars(&text, EXCERPT_CHARS);
            let ellipsis = if excerpt.len() < text.len() { "…" } else { "" };
            format!("- {}: {excerpt}{ellipsis}", source_label(chunk))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_answer(timestamp: &DateTime<Utc>, topic: &str, question: &str, answer: &str) -> String {
    format!(
        "# Query Results\n\
         **Generated**: {}\n\
         **Topic**: {topic}\n\
         **Question**: {question}\n\n\
         ## Answer\n\n\
         {answer}\n\n\
         ---\n\
         *Generated by arxiv-rag-agent*\n",
        timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn render_sources(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::from("# Sources\n");
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!("\n## {}. {}\n", i + 1, source_label(chunk)));
        if let Some(score) = chunk.score {
            out.push_str(&format!("*score {score:.3}*\n"));
        }
        if let Some(url) = chunk.metadata.as_ref().and_then(|m| m.source_url.as_deref()) {
            out.push_str(&format!("<{url}>\n"));
        }
        out.push('\n');
        for line in chunk.text.trim().lines() {
            out.push_str("> ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
