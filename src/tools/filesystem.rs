/// Local-filesystem collaborator, confined by the server to the outputs
/// directory.
use serde_json::json;

use crate::error::ToolError;
use crate::mcp::{McpManager, ServerName};
use crate::tools::text_payload;

pub const WRITE_FILE: &str = "write_file";
pub const READ_FILE: &str = "read_file";

pub struct LocalFiles<'a> {
    mcp: &'a McpManager,
}

impl<'a> LocalFiles<'a> {
    #[must_use]
    pub fn new(mcp: &'a McpManager) -> Self {
        Self { mcp }
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), ToolError> {
        self.mcp
            .invoke_json(
                ServerName::Filesystem,
                WRITE_FILE,
                json!({ "path": path, "content": content }),
            )
            .await
            .map(|_| ())
    }

    pub async fn read_file(&self, path: &str) -> Result<String, ToolError> {
        let output = self
            .mcp
            .invoke_json(ServerName::Filesystem, READ_FILE, json!({ "path": path }))
            .await?;
        Ok(text_payload(&output, &["content"]))
    }
}
