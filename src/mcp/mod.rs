//! MCP client side: the fixed set of tool servers, how they are launched, and
//! the manager that routes `invoke(server, operation, arguments)` calls.
pub mod client;
pub mod manager;
pub mod output;
pub mod servers;

use std::fmt;

pub use client::{ServerLauncher, StdioLauncher, ToolClient};
pub use manager::McpManager;
pub use output::ToolOutput;
pub use servers::{ServerSpec, server_specs};

/// Arguments of a tool call.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// The collaborators this agent talks to. One tool server each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServerName {
    /// Paper search, download and full-text reading.
    Arxiv,
    /// Web page scraping.
    Firecrawl,
    /// Vector index with integrated embedding.
    Pinecone,
    /// Query log database.
    Notion,
    /// Local output directory.
    Filesystem,
}

impl ServerName {
    pub const ALL: [ServerName; 5] = [
        ServerName::Arxiv,
        ServerName::Firecrawl,
        ServerName::Pinecone,
        ServerName::Notion,
        ServerName::Filesystem,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServerName::Arxiv => "arxiv",
            ServerName::Firecrawl => "firecrawl",
            ServerName::Pinecone => "pinecone",
            ServerName::Notion => "notion",
            ServerName::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
