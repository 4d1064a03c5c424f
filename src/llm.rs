/// Answer generation through an OpenAI-compatible chat completions endpoint.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, LlmConfig};
use crate::error::GenerationError;

const SYSTEM_PROMPT: &str = "You are a helpful research assistant.";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1000;

/// Produces an answer to `question` from an assembled context block.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError>;
}

/// Build the user prompt sent alongside the system prompt.
#[must_use]
pub fn build_prompt(topic: &str, question: &str, context: &str) -> String {
    format!(
        "You are a helpful AI assistant that answers questions based on academic papers about {topic}.\n\n\
         Use ONLY the context provided below to answer the question. \
         If the context doesn't contain enough information, say so.\n\n\
         CONTEXT:\n{context}\n\n\
         QUESTION: {question}\n\n\
         Provide a concise, well-cited answer. Include paper titles when referencing information."
    )
}

// ── OpenAI chat completions ──────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    llm: LlmConfig,
    topic: String,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeouts.llm)
            .user_agent(concat!("arxiv-rag-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: config.credentials.openai_api_key.clone(),
            llm: config.llm.clone(),
            topic: config.search_topic.clone(),
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerationError> {
        let prompt = build_prompt(&self.topic, question, context);
        let body = ChatRequest {
            model: &self.llm.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", self.llm.base_url);
        debug!("POST {url} (model {})", self.llm.model);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}
