/// Configuration module for the agent.
///
/// Reads every setting from the process environment once at startup, applies
/// defaults, and validates the result. The resulting [`Config`] is immutable and
/// passed by reference to everything downstream.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

// ── Environment keys ─────────────────────────────────────────────────

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const FIRECRAWL_API_KEY: &str = "FIRECRAWL_API_KEY";
pub const NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";

/// Credentials without which no phase can run.
pub const REQUIRED_CREDENTIALS: [&str; 5] = [
    OPENAI_API_KEY,
    PINECONE_API_KEY,
    FIRECRAWL_API_KEY,
    NOTION_TOKEN,
    NOTION_DATABASE_ID,
];

// ── Default value functions ──────────────────────────────────────────

fn default_index_name() -> String {
    "arxiv-papers".to_string()
}

fn default_namespace() -> String {
    "papers".to_string()
}

fn default_embed_model() -> String {
    "llama-text-embed-v2".to_string()
}

fn default_search_topic() -> String {
    "Higgs Boson production in association with a single top quark".to_string()
}

fn default_user_query() -> String {
    "What are the latest techniques in LLM reasoning?".to_string()
}

fn default_max_papers() -> usize {
    10
}

fn default_top_k() -> usize {
    5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_context_chars() -> usize {
    12_000
}

fn default_llm_model() -> String {
    "gpt-4".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_server_start_secs() -> u64 {
    60
}

fn default_tool_call_secs() -> u64 {
    120
}

fn default_llm_secs() -> u64 {
    120
}

// ── Errors ───────────────────────────────────────────────────────────

/// Configuration problems. Always fatal, always raised before any tool
/// server is started.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

// ── Phase selector ───────────────────────────────────────────────────

/// Which workflow(s) a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Phase {
    Ingestion,
    Query,
    #[default]
    Both,
}

impl Phase {
    #[must_use]
    pub fn includes_ingestion(self) -> bool {
        matches!(self, Phase::Ingestion | Phase::Both)
    }

    #[must_use]
    pub fn includes_query(self) -> bool {
        matches!(self, Phase::Query | Phase::Both)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Ingestion => "ingestion",
            Phase::Query => "query",
            Phase::Both => "both",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingestion" => Ok(Phase::Ingestion),
            "query" => Ok(Phase::Query),
            "both" => Ok(Phase::Both),
            other => Err(format!(
                "expected one of ingestion, query, both (got {other:?})"
            )),
        }
    }
}

// ── Config structs ───────────────────────────────────────────────────

/// API credentials for every collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub openai_api_key: String,
    pub pinecone_api_key: String,
    pub firecrawl_api_key: String,
    pub notion_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("pinecone_api_key", &"<redacted>")
            .field("firecrawl_api_key", &"<redacted>")
            .field("notion_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub name: String,
    pub namespace: String,
    pub embed_model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub server_start: Duration,
    pub tool_call: Duration,
    pub llm: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub logs_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credentials: Credentials,
    pub notion_database_id: String,
    pub index: IndexConfig,
    pub search_topic: String,
    /// `None` searches across all categories.
    pub categories: Option<Vec<String>>,
    pub max_papers: usize,
    pub phase: Phase,
    pub user_query: String,
    pub top_k: usize,
    pub chunking: ChunkingConfig,
    pub max_context_chars: usize,
    pub llm: LlmConfig,
    pub timeouts: Timeouts,
    pub paths: Paths,
}

/// A lookup that answers from `overrides` first, then from `fallback`.
fn layered<'a, F>(
    overrides: &'a [(&str, String)],
    fallback: F,
) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key: &str| {
        overrides
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| fallback(key))
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from the process environment, with `overrides`
    /// (command-line values) taking precedence over the variables they name.
    pub fn from_env_with(overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        Self::from_lookup(layered(overrides, |key| std::env::var(key).ok()))
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty or whitespace-only values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        // Credentials first: a missing one must fail before anything else is parsed.
        let credentials = Credentials {
            openai_api_key: require(OPENAI_API_KEY)?,
            pinecone_api_key: require(PINECONE_API_KEY)?,
            firecrawl_api_key: require(FIRECRAWL_API_KEY)?,
            notion_token: require(NOTION_TOKEN)?,
        };
        let notion_database_id = require(NOTION_DATABASE_ID)?;

        let categories = get("ARXIV_CATEGORIES").map(|raw| parse_categories(&raw));
        let categories = categories.filter(|c| !c.is_empty());

        let phase = match get("PHASE") {
            Some(raw) => raw.parse::<Phase>().map_err(|reason| ConfigError::Invalid {
                key: "PHASE",
                value: raw,
                reason,
            })?,
            None => Phase::default(),
        };

        let cfg = Self {
            credentials,
            notion_database_id,
            index: IndexConfig {
                name: get("PINECONE_INDEX_NAME").unwrap_or_else(default_index_name),
                namespace: get("PINECONE_NAMESPACE").unwrap_or_else(default_namespace),
                embed_model: get("PINECONE_EMBED_MODEL").unwrap_or_else(default_embed_model),
            },
            search_topic: get("SEARCH_TOPIC").unwrap_or_else(default_search_topic),
            categories,
            max_papers: parse_number(&get, "MAX_PAPERS", default_max_papers())?,
            phase,
            user_query: get("USER_QUERY").unwrap_or_else(default_user_query),
            top_k: parse_number(&get, "TOP_K", default_top_k())?,
            chunking: ChunkingConfig {
                size: parse_number(&get, "CHUNK_SIZE", default_chunk_size())?,
                overlap: parse_number(&get, "CHUNK_OVERLAP", default_chunk_overlap())?,
            },
            max_context_chars: parse_number(
                &get,
                "MAX_CONTEXT_CHARS",
                default_max_context_chars(),
            )?,
            llm: LlmConfig {
                model: get("OPENAI_MODEL").unwrap_or_else(default_llm_model),
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(default_llm_base_url)
                    .trim_end_matches('/')
                    .to_string(),
            },
            timeouts: Timeouts {
                server_start: Duration::from_secs(parse_number(
                    &get,
                    "SERVER_START_TIMEOUT_SECS",
                    default_server_start_secs(),
                )?),
                tool_call: Duration::from_secs(parse_number(
                    &get,
                    "TOOL_CALL_TIMEOUT_SECS",
                    default_tool_call_secs(),
                )?),
                llm: Duration::from_secs(parse_number(
                    &get,
                    "LLM_TIMEOUT_SECS",
                    default_llm_secs(),
                )?),
            },
            paths: Paths {
                data_dir: get("DATA_DIR").map_or_else(|| PathBuf::from("/app/data"), PathBuf::from),
                outputs_dir: get("OUTPUTS_DIR")
                    .map_or_else(|| PathBuf::from("/app/outputs"), PathBuf::from),
                logs_dir: get("LOGS_DIR").map_or_else(|| PathBuf::from("/app/logs"), PathBuf::from),
            },
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("MAX_PAPERS", self.max_papers)?;
        ensure_positive("TOP_K", self.top_k)?;
        ensure_positive("CHUNK_SIZE", self.chunking.size)?;
        ensure_positive("MAX_CONTEXT_CHARS", self.max_context_chars)?;
        if self.chunking.overlap >= self.chunking.size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP",
                value: self.chunking.overlap.to_string(),
                reason: format!("must be smaller than CHUNK_SIZE ({})", self.chunking.size),
            });
        }
        for (key, timeout) in [
            ("SERVER_START_TIMEOUT_SECS", self.timeouts.server_start),
            ("TOOL_CALL_TIMEOUT_SECS", self.timeouts.tool_call),
            ("LLM_TIMEOUT_SECS", self.timeouts.llm),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::Invalid {
                    key,
                    value: "0".to_string(),
                    reason: "timeout must be positive".to_string(),
                });
            }
        }
        if self.user_query.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "USER_QUERY",
                value: self.user_query.clone(),
                reason: "question must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Create the data, outputs and logs directories if they are missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.paths.data_dir,
            &self.paths.outputs_dir,
            &self.paths.logs_dir,
        ] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                warn!("Failed to create {}: {e}", dir.display());
                return Err(e);
            }
        }
        Ok(())
    }

    /// Log the non-secret settings of this run.
    pub fn log_summary(&self) {
        info!("Phase: {}", self.phase);
        info!("Topic: {}", self.search_topic);
        info!(
            "Index: {} (namespace {}), max papers {}, top_k {}",
            self.index.name, self.index.namespace, self.max_papers, self.top_k
        );
        if let Some(categories) = &self.categories {
            info!("Categories: {}", categories.join(", "));
        }
    }
}

// ── Parsing helpers ──────────────────────────────────────────────────

/// Split a comma-separated category list, dropping blanks.
fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn ensure_positive(key: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────
