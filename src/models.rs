use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A paper as returned by the paper-store search.
///
/// Search servers disagree on field names (`id` vs `entry_id`, `url` vs
/// `pdf_url`), so deserialization accepts the common aliases.
/// `null` fields are treated as absent, and a numeric id is read as text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaperRecord {
    #[serde(default, alias = "entry_id", alias = "paper_id", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default = "unknown_title", deserialize_with = "title")]
    pub title: String,
    #[serde(default, deserialize_with = "authors")]
    pub authors: Vec<String>,
    #[serde(default, alias = "summary", deserialize_with = "lenient_string")]
    pub r#abstract: String,
    #[serde(default, alias = "pdf_url", alias = "link")]
    pub url: Option<String>,
}

fn unknown_title() -> String {
    "Unknown".to_string()
}

fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}

fn title<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    let title = lenient_string(de)?;
    Ok(if title.trim().is_empty() { unknown_title() } else { title })
}

/// Authors arrive either as plain strings or as `{ "name": ... }` objects.
fn authors<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect())
}

/// Metadata stored alongside every chunk in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChunkMetadata {
    pub paper_id: String,
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// One record sent to the vector index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl ChunkRecord {
    /// Record ids are stable per paper and position, so re-ingesting a paper
    /// overwrites its previous chunks.
    #[must_use]
    pub fn record_id(paper_id: &str, chunk_index: usize) -> String {
        format!("{paper_id}#{chunk_index}")
    }
}

/// A match returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub score: Option<f64>,
    pub metadata: Option<ChunkMetadata>,
}

impl RetrievedChunk {
    #[must_use]
    pub fn title(&self) -> &str {
        self.metadata.as_ref().map_or("Unknown", |m| m.title.as_str())
    }

    #[must_use]
    pub fn paper_id(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.paper_id.as_str())
    }

    #[must_use]
    pub fn chunk_index(&self) -> usize {
        self.metadata.as_ref().map_or(0, |m| m.chunk_index)
    }
}

/// The record written to the logging collaborator after each query.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub answer: String,
    pub sources: String,
}
