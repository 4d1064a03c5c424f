//! Typed interfaces over the tool servers: one method per declared
//! operation. Each wraps a borrowed [`McpManager`] and turns raw
//! [`ToolOutput`]s into domain types.
pub mod arxiv;
pub mod filesystem;
pub mod firecrawl;
pub mod notion;
pub mod pinecone;

pub use arxiv::PaperStore;
pub use filesystem::LocalFiles;
pub use firecrawl::WebScraper;
pub use notion::QueryLog;
pub use pinecone::VectorIndex;

use serde_json::Value;

use crate::error::ToolError;
use crate::mcp::{ServerName, ToolOutput};

/// Decode a tool payload as JSON, tagging failures with where they came from.
pub(crate) fn decode_json(
    server: ServerName,
    operation: &str,
    output: &ToolOutput,
) -> Result<Value, ToolError> {
    output.to_value().map_err(|e| ToolError::Decode {
        server,
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

/// Some servers wrap text in a JSON object (`{"content": "..."}` and the
/// like); others return it bare. Returns the first string field found under
/// `keys`, or the raw text when the payload is not such an object.
pub(crate) fn text_payload(output: &ToolOutput, keys: &[&str]) -> String {
    if let Ok(Value::Object(map)) = output.to_value() {
        for key in keys {
            if let Some(text) = map.get(*key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
        if let Some(data) = map.get("data").and_then(Value::as_object) {
            for key in keys {
                if let Some(text) = data.get(*key).and_then(Value::as_str) {
                    return text.to_string();
                }
            }
        }
    }
    output.text.clone()
}
