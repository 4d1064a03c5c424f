/// Static declaration of the tool servers and how to launch them.
use std::collections::BTreeMap;

use crate::config::Config;
use crate::mcp::ServerName;

/// Launch command, arguments and extra environment for one tool server.
///
/// The child inherits the agent's environment; `env` is layered on top.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub name: ServerName,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl std::fmt::Debug for ServerSpec {
    // env carries API keys; only the names are printed.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSpec")
            .field("name", &self.name)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ServerSpec {
    fn new(name: ServerName, command: &str, args: &[&str]) -> Self {
        Self {
            name,
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: BTreeMap::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.insert(key.to_string(), value.into());
        self
    }

    /// Human-readable command line, for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The full set of servers, in start order.
#[must_use]
pub fn server_specs(config: &Config) -> Vec<ServerSpec> {
    let paper_store = config.paths.data_dir.join("arxiv_papers");
    let paper_store = paper_store.to_string_lossy().to_string();
    let outputs = config.paths.outputs_dir.to_string_lossy().to_string();
    let creds = &config.credentials;

    ServerName::ALL
        .into_iter()
        .map(|name| match name {
            ServerName::Arxiv => {
                ServerSpec::new(name, "uv", &["tool", "run", "arxiv-mcp-server", "--storage-path"])
                    .arg(paper_store.clone())
                    .env("ARXIV_STORAGE_PATH", paper_store.clone())
            }
            ServerName::Firecrawl => ServerSpec::new(name, "npx", &["-y", "firecrawl-mcp"])
                .env("FIRECRAWL_API_KEY", creds.firecrawl_api_key.clone()),
            ServerName::Pinecone => ServerSpec::new(name, "npx", &["-y", "@pinecone-database/mcp"])
                .env("PINECONE_API_KEY", creds.pinecone_api_key.clone()),
            ServerName::Notion => {
                ServerSpec::new(name, "npx", &["-y", "@notionhq/notion-mcp-server"])
                    .env("NOTION_TOKEN", creds.notion_token.clone())
            }
            ServerName::Filesystem => ServerSpec::new(
                name,
                "npx",
                &["-y", "@modelcontextprotocol/server-filesystem"],
            )
            .arg(outputs.clone()),
        })
        .collect()
}
