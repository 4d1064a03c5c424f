/// Query-log collaborator: one database page per answered question.
use serde_json::{Value, json};

use crate::chunking::truncate_chars;
use crate::error::ToolError;
use crate::mcp::{McpManager, ServerName};
use crate::models::LogEntry;

pub const CREATE_PAGE: &str = "notion_create_page";

/// Rich-text properties are capped at this many characters.
pub const RICH_TEXT_LIMIT: usize = 2000;

pub struct QueryLog<'a> {
    mcp: &'a McpManager,
    database_id: &'a str,
}

impl<'a> QueryLog<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager, database_id: &'a str) -> Self {
        Self { mcp, database_id }
    }

    pub async fn create_record(&self, entry: &LogEntry) -> Result<(), ToolError> {
        self.mcp
            .invoke_json(ServerName::Notion, CREATE_PAGE, page_request(self.database_id, entry))
            .await
            .map(|_| ())
    }
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": truncate_chars(content, RICH_TEXT_LIMIT) } }] })
}

fn page_request(database_id: &str, entry: &LogEntry) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Query": { "title": [{ "text": { "content": truncate_chars(&entry.title, RICH_TEXT_LIMIT) } }] },
            "Timestamp": { "date": { "start": entry.timestamp.to_rfc3339() } },
            "Answer": rich_text(&entry.answer),
            "Sources": rich_text(&entry.sources),
        }
    })
}
