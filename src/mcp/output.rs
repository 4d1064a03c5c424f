/// Decoded result of a tool call.
///
/// Works on the wire form of `CallToolResult` (`content`, `structuredContent`,
/// `isError`) rather than on rmcp's model types, so test doubles can build
/// results without an MCP session.
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    /// Concatenated `text` content blocks, newline separated.
    pub text: String,
    pub structured: Option<Value>,
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful plain-text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A successful result carrying JSON, encoded as text the way most
    /// servers return it.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        Self::text(serde_json::to_string(value).unwrap_or_default())
    }

    /// A result the server flagged with `isError`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: message.into(),
            is_error: true,
            ..Self::default()
        }
    }

    /// Build from the JSON wire form of a `CallToolResult`.
    #[must_use]
    pub fn from_wire(value: &Value) -> Self {
        let text = value
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        Self {
            text,
            structured: value
                .get("structuredContent")
                .filter(|v| !v.is_null())
                .cloned(),
            is_error: value
                .get("isError")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// The payload as JSON: structured content if present, otherwise the text
    /// parsed as JSON.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match &self.structured {
            Some(v) => Ok(v.clone()),
            None => serde_json::from_str(self.text.trim()),
        }
    }

    /// Deserialize the payload into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value()?)
    }
}
