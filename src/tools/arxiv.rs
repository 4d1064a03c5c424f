/// Paper-store collaborator: search, download and read arXiv papers.
use serde_json::{Value, json};
use tracing::warn;

use crate::error::ToolError;
use crate::mcp::{McpManager, ServerName};
use crate::models::PaperRecord;
use crate::tools::{decode_json, text_payload};

pub const SEARCH_PAPERS: &str = "search_papers";
pub const DOWNLOAD_PAPER: &str = "download_paper";
pub const READ_PAPER: &str = "read_paper";

const SERVER: ServerName = ServerName::Arxiv;

/// Papers from one search. Entries that could not be read are only counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub papers: Vec<PaperRecord>,
    pub malformed: usize,
}

pub struct PaperStore<'a> {
    mcp: &'a McpManager,
}

impl<'a> PaperStore<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager) -> Self {
        Self { mcp }
    }

    /// Search for papers on `topic`. Categories are only sent when given.
    pub async fn search(
        &self,
        topic: &str,
        categories: Option<&[String]>,
        max_results: usize,
    ) -> Result<SearchResults, ToolError> {
        let mut args = json!({
            "query": topic,
            "max_results": max_results,
        });
        if let Some(categories) = categories.filter(|c| !c.is_empty()) {
            args["categories"] = json!(categories);
        }

        let output = self.mcp.invoke_json(SERVER, SEARCH_PAPERS, args).await?;
        if output.text.trim().is_empty() && output.structured.is_none() {
            return Ok(SearchResults::default());
        }
        let value = decode_json(SERVER, SEARCH_PAPERS, &output)?;
        parse_search_results(value).map_err(|message| ToolError::Decode {
            server: SERVER,
            operation: SEARCH_PAPERS.to_string(),
            message,
        })
    }

    /// Ask the server to fetch the paper into its local storage.
    pub async fn download(&self, paper_id: &str) -> Result<(), ToolError> {
        self.mcp
            .invoke_json(SERVER, DOWNLOAD_PAPER, json!({ "paper_id": paper_id }))
            .await
            .map(|_| ())
    }

    /// Full text of a previously downloaded paper.
    pub async fn read(&self, paper_id: &str) -> Result<String, ToolError> {
        let output = self
            .mcp
            .invoke_json(SERVER, READ_PAPER, json!({ "paper_id": paper_id }))
            .await?;

        if let Ok(Value::Object(map)) = output.to_value() {
            if map.get("status").and_then(Value::as_str) == Some("error") {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("read failed")
                    .to_string();
                return Err(ToolError::Reported {
                    server: SERVER,
                    operation: READ_PAPER.to_string(),
                    message,
                });
            }
        }
        Ok(text_payload(&output, &["content", "text"]))
    }
}

/// Accepts either a bare list of papers or an object with a `papers` list.
/// Each entry is read on its own; one that does not deserialize is logged and
/// counted instead of failing the search. Entries without an id are kept so
/// the caller can count them as skipped.
fn parse_search_results(value: Value) -> Result<SearchResults, String> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("papers") {
            Some(Value::Array(items)) => items,
            Some(other) => return Err(format!("`papers` is not a list: {other}")),
            None => return Err("search result has no `papers` list".to_string()),
        },
        other => return Err(format!("unexpected search result: {other}")),
    };

    let mut results = SearchResults::default();
    for (i, item) in list.into_iter().enumerate() {
        match serde_json::from_value::<PaperRecord>(item) {
            Ok(paper) => results.papers.push(paper),
            Err(e) => {
                warn!("Ignoring search result {}: {e}", i + 1);
                results.malformed += 1;
            }
        }
    }
    Ok(results)
}
