/// Web-scrape collaborator.
use serde_json::json;

use crate::error::ToolError;
use crate::mcp::{McpManager, ServerName};
use crate::tools::text_payload;

pub const SCRAPE: &str = "firecrawl_scrape";

pub struct WebScraper<'a> {
    mcp: &'a McpManager,
}

impl<'a> WebScraper<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager) -> Self {
        Self { mcp }
    }

    /// Extracted page text as markdown.
    pub async fn scrape(&self, url: &str) -> Result<String, ToolError> {
        let output = self
            .mcp
            .invoke_json(
                ServerName::Firecrawl,
                SCRAPE,
                json!({ "url": url, "formats": ["markdown"] }),
            )
            .await?;
        Ok(text_payload(&output, &["markdown", "content"]))
    }
}
