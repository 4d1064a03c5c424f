//! In-process stand-ins for the tool servers and the generator.
//!
//! A [`FakeWorld`] holds the state every fake server reads and writes, plus a
//! sequenced log of every call so tests can check ordering.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use arxiv_rag_agent::config::{Config, REQUIRED_CREDENTIALS};
use arxiv_rag_agent::error::{GenerationError, ToolError};
use arxiv_rag_agent::llm::Generator;
use arxiv_rag_agent::mcp::{JsonObject, ServerLauncher, ServerName, ServerSpec, ToolClient, ToolOutput};
use async_trait::async_trait;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub seq: usize,
    pub server: ServerName,
    pub operation: String,
    pub arguments: Value,
}

#[derive(Default)]
pub struct FakeWorld {
    /// What `search_papers` returns.
    pub papers: Vec<Value>,
    /// `read_paper` text by paper id; ids missing here fail to read.
    pub paper_texts: HashMap<String, String>,
    /// `firecrawl_scrape` text by URL; URLs missing here are unreachable.
    pub pages: HashMap<String, String>,
    /// Records upserted into the vector index, by id.
    pub vectors: BTreeMap<String, Value>,
    pub index_exists: bool,
    pub notion_pages: Vec<Value>,
    pub files: BTreeMap<String, String>,
    /// `(server, operation)` pairs that report an error.
    pub failing: HashSet<(ServerName, String)>,
    pub refuse_launch: Option<ServerName>,
    pub launched: Vec<ServerName>,
    pub stopped: Vec<ServerName>,
    pub calls: Vec<Call>,
}

pub type World = Arc<Mutex<FakeWorld>>;

impl FakeWorld {
    pub fn shared(self) -> World {
        Arc::new(Mutex::new(self))
    }

    /// A world with `ids.len()` readable papers about attention.
    pub fn with_papers(ids: &[&str]) -> Self {
        let mut world = FakeWorld {
            index_exists: true,
            ..FakeWorld::default()
        };
        for id in ids {
            world.papers.push(json!({
                "id": id,
                "title": format!("On attention {id}"),
                "authors": ["A. Vaswani"],
                "url": format!("https://arxiv.org/abs/{id}"),
            }));
            world
                .paper_texts
                .insert(id.to_string(), paper_text(id));
        }
        world
    }

    pub fn fail(&mut self, server: ServerName, operation: &str) {
        self.failing.insert((server, operation.to_string()));
    }

    pub fn calls_to(&self, server: ServerName, operation: &str) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| c.server == server && c.operation == operation)
            .collect()
    }

    fn handle(&mut self, server: ServerName, operation: &str, args: &JsonObject) -> ToolOutput {
        let seq = self.calls.len();
        self.calls.push(Call {
            seq,
            server,
            operation: operation.to_string(),
            arguments: Value::Object(args.clone()),
        });

        if self.failing.contains(&(server, operation.to_string())) {
            return ToolOutput::error(format!("{operation} failed"));
        }

        let str_arg = |key: &str| args.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

        match (server, operation) {
            (ServerName::Arxiv, "search_papers") => {
                let max = args.get("max_results").and_then(Value::as_u64).unwrap_or(10) as usize;
                let papers: Vec<Value> = self.papers.iter().take(max).cloned().collect();
                ToolOutput::json(&json!({ "total_results": papers.len(), "papers": papers }))
            }
            (ServerName::Arxiv, "download_paper") => {
                ToolOutput::json(&json!({ "status": "success" }))
            }
            (ServerName::Arxiv, "read_paper") => match self.paper_texts.get(&str_arg("paper_id")) {
                Some(text) => ToolOutput::json(&json!({ "status": "success", "content": text })),
                None => ToolOutput::json(&json!({ "status": "error", "message": "Paper not found" })),
            },
            (ServerName::Firecrawl, "firecrawl_scrape") => match self.pages.get(&str_arg("url")) {
                Some(text) => ToolOutput::text(text.clone()),
                None => ToolOutput::error("ERR_NAME_NOT_RESOLVED"),
            },
            (ServerName::Pinecone, "describe-index-stats") => {
                if self.index_exists {
                    ToolOutput::json(&json!({ "totalRecordCount": self.vectors.len() }))
                } else {
                    ToolOutput::error("index not found")
                }
            }
            (ServerName::Pinecone, "create-index-for-model") => {
                self.index_exists = true;
                ToolOutput::text("created")
            }
            (ServerName::Pinecone, "upsert-records") => {
                let records = args.get("records").and_then(Value::as_array).cloned().unwrap_or_default();
                for record in records {
                    let id = record["id"].as_str().unwrap_or_default().to_string();
                    self.vectors.insert(id, record);
                }
                ToolOutput::text("ok")
            }
            (ServerName::Pinecone, "query-index") => {
                // Rank by how many query words the chunk text contains.
                let query = str_arg("query").to_lowercase();
                let top_k = args.get("top_k").and_then(Value::as_u64).unwrap_or(5) as usize;
                let mut scored: Vec<(usize, &Value)> = self
                    .vectors
                    .values()
                    .map(|r| {
                        let text = r["text"].as_str().unwrap_or_default().to_lowercase();
                        let score = query.split_whitespace().filter(|w| text.contains(w)).count();
                        (score, r)
                    })
                    .collect();
                scored.sort_by(|a, b| b.0.cmp(&a.0));
                let matches: Vec<Value> = scored
                    .into_iter()
                    .take(top_k)
                    .map(|(score, r)| {
                        json!({
                            "id": r["id"],
                            "score": score as f64,
                            "text": r["text"],
                            "metadata": r["metadata"],
                        })
                    })
                    .collect();
                ToolOutput::json(&json!({ "matches": matches }))
            }
            (ServerName::Notion, "notion_create_page") => {
                self.notion_pages.push(Value::Object(args.clone()));
                ToolOutput::json(&json!({ "object": "page", "id": "page-1" }))
            }
            (ServerName::Filesystem, "write_file") => {
                self.files.insert(str_arg("path"), str_arg("content"));
                ToolOutput::text(format!("Successfully wrote to {}", str_arg("path")))
            }
            (ServerName::Filesystem, "read_file") => match self.files.get(&str_arg("path")) {
                Some(content) => ToolOutput::text(content.clone()),
                None => ToolOutput::error("ENOENT"),
            },
            _ => ToolOutput::error(format!("unhandled {server}.{operation}")),
        }
    }
}

/// Several paragraphs so the splitter yields more than one chunk.
pub fn paper_text(id: &str) -> String {
    (0..6)
        .map(|i| {
            format!(
                "Section {i} of paper {id}. Attention lets every token weigh every other token. {}",
                "Scaled dot products are normalised with a softmax. ".repeat(8)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn operations(server: ServerName) -> &'static [&'static str] {
    match server {
        ServerName::Arxiv => &["search_papers", "download_paper", "read_paper", "list_papers"],
        ServerName::Firecrawl => &["firecrawl_scrape", "firecrawl_search"],
        ServerName::Pinecone => &[
            "describe-index-stats",
            "create-index-for-model",
            "upsert-records",
            "query-index",
        ],
        ServerName::Notion => &["notion_create_page"],
        ServerName::Filesystem => &["write_file", "read_file"],
    }
}

pub struct FakeClient {
    name: ServerName,
    world: World,
}

#[async_trait]
impl ToolClient for FakeClient {
    async fn list_operations(&self) -> Result<Vec<String>, ToolError> {
        Ok(operations(self.name).iter().map(|s| s.to_string()).collect())
    }

    async fn call(&self, operation: &str, arguments: JsonObject) -> Result<ToolOutput, ToolError> {
        Ok(self.world.lock().unwrap().handle(self.name, operation, &arguments))
    }

    async fn shutdown(self: Box<Self>) -> Result<(), ToolError> {
        self.world.lock().unwrap().stopped.push(self.name);
        Ok(())
    }
}

pub struct FakeLauncher {
    pub world: World,
}

#[async_trait]
impl ServerLauncher for FakeLauncher {
    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ToolClient>, ToolError> {
        let mut world = self.world.lock().unwrap();
        if world.refuse_launch == Some(spec.name) {
            return Err(ToolError::StartFailed {
                server: spec.name,
                message: "spawn failed: No such file or directory".to_string(),
            });
        }
        world.launched.push(spec.name);
        Ok(Box::new(FakeClient {
            name: spec.name,
            world: self.world.clone(),
        }))
    }
}

/// Returns a canned answer and remembers what it was asked.
#[derive(Default)]
pub struct CannedGenerator {
    pub fail: bool,
    /// Never answers.
    pub stall: bool,
    pub prompts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap()
            .push((question.to_string(), context.to_string()));
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(GenerationError::Api {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        Ok("Attention weighs tokens against each other.".to_string())
    }
}

/// A valid config with every credential set, plus `overrides`.
pub fn config(overrides: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = REQUIRED_CREDENTIALS
        .iter()
        .map(|k| (k.to_string(), format!("test-{k}")))
        .collect();
    env.insert("OUTPUTS_DIR".to_string(), "/out".to_string());
    env.insert("CHUNK_SIZE".to_string(), "400".to_string());
    env.insert("CHUNK_OVERLAP".to_string(), "50".to_string());
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|k| env.get(k).cloned()).expect("test config is valid")
}
