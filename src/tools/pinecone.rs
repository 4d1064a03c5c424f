/// Vector-index collaborator. The index embeds record text itself, so the
/// agent only ever sends and receives text plus metadata.
use serde_json::{Map, Value, json};
use tracing::info;

use crate::config::IndexConfig;
use crate::error::ToolError;
use crate::mcp::{McpManager, ServerName};
use crate::models::{ChunkMetadata, ChunkRecord, RetrievedChunk};
use crate::tools::decode_json;

pub const DESCRIBE_INDEX_STATS: &str = "describe-index-stats";
pub const CREATE_INDEX_FOR_MODEL: &str = "create-index-for-model";
pub const UPSERT_RECORDS: &str = "upsert-records";
pub const QUERY_INDEX: &str = "query-index";

const SERVER: ServerName = ServerName::Pinecone;

/// Dimension of the default integrated embedding model.
const EMBED_DIMENSION: usize = 1024;

pub struct VectorIndex<'a> {
    mcp: &'a McpManager,
    index: &'a IndexConfig,
}

impl<'a> VectorIndex<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager, index: &'a IndexConfig) -> Self {
        Self { mcp, index }
    }

    /// Make sure the index exists, creating it for the configured embedding
    /// model when the stats lookup is refused.
    pub async fn ensure_index(&self) -> Result<(), ToolError> {
        let describe = self
            .mcp
            .invoke_json(
                SERVER,
                DESCRIBE_INDEX_STATS,
                json!({ "index_name": self.index.name }),
            )
            .await;

        match describe {
            Ok(_) => {
                info!("Index '{}' already exists", self.index.name);
                Ok(())
            }
            Err(ToolError::Reported { message, .. }) => {
                info!("Creating index '{}' ({message})", self.index.name);
                self.mcp
                    .invoke_json(
                        SERVER,
                        CREATE_INDEX_FOR_MODEL,
                        json!({
                            "index_name": self.index.name,
                            "model": self.index.embed_model,
                            "dimension": EMBED_DIMENSION,
                            "metric": "cosine",
                        }),
                    )
                    .await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Upsert a batch of records. Returns how many were sent.
    pub async fn upsert(&self, records: &[ChunkRecord]) -> Result<usize, ToolError> {
        if records.is_empty() {
            return Ok(0);
        }
        self.mcp
            .invoke_json(
                SERVER,
                UPSERT_RECORDS,
                json!({
                    "index_name": self.index.name,
                    "namespace": self.index.namespace,
                    "records": records,
                }),
            )
            .await?;
        Ok(records.len())
    }

    /// The `top_k` records most similar to `text`, best first. Never returns
    /// more than `top_k` even if the server does.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedChunk>, ToolError> {
        let output = self
            .mcp
            .invoke_json(
                SERVER,
                QUERY_INDEX,
                json!({
                    "index_name": self.index.name,
                    "namespace": self.index.namespace,
                    "query": text,
                    "top_k": top_k,
                    "include_metadata": true,
                }),
            )
            .await?;

        if output.text.trim().is_empty() && output.structured.is_none() {
            return Ok(Vec::new());
        }
        let value = decode_json(SERVER, QUERY_INDEX, &output)?;
        let mut matches = parse_matches(value).map_err(|message| ToolError::Decode {
            server: SERVER,
            operation: QUERY_INDEX.to_string(),
            message,
        })?;
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// Accepts a bare list, `{"matches": [...]}` or `{"result": {"hits": [...]}}`.
fn parse_matches(value: Value) -> Result<Vec<RetrievedChunk>, String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("matches") {
                items
            } else if let Some(Value::Array(items)) = map
                .remove("result")
                .and_then(|mut r| r.get_mut("hits").map(Value::take))
            {
                items
            } else {
                return Err("query result has no `matches` or `result.hits` list".to_string());
            }
        }
        other => return Err(format!("unexpected query result: {other}")),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(parse_match(map)),
            _ => None,
        })
        .collect())
}

fn parse_match(mut item: Map<String, Value>) -> RetrievedChunk {
    let id = take_str(&mut item, &["id", "_id"]).unwrap_or_default();
    let score = ["score", "_score"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_f64));

    // Metadata lives under `metadata` or, for integrated-embedding hits, `fields`.
    let mut metadata = item
        .remove("metadata")
        .or_else(|| item.remove("fields"))
        .and_then(|v| match v {
            Value::Object(m) => Some(m),
            _ => None,
        })
        .unwrap_or_default();

    let text = take_str(&mut item, &["text", "chunk_text"])
        .or_else(|| take_str(&mut metadata, &["text", "chunk_text"]))
        .unwrap_or_default();

    let metadata = serde_json::from_value::<ChunkMetadata>(Value::Object(metadata)).ok();

    RetrievedChunk {
        id,
        text,
        score,
        metadata,
    }
}

fn take_str(map: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match map.remove(*k) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
