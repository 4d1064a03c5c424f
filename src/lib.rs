//! # arxiv-rag-agent: two-phase arXiv RAG pipeline over MCP tool servers
//!
//! Phase 1 searches arXiv for a topic, pulls each paper's text, chunks it and
//! upserts the chunks into a vector index. Phase 2 retrieves the chunks most
//! relevant to a question, asks an LLM for an answer, logs the exchange and
//! writes the answer to disk. All storage, search and scraping is done by
//! external tool servers spoken to over the Model Context Protocol.
//!
//! ## Architecture
//!
//! - **[`config`]**: Environment loading, defaults and validation
//! - **[`mcp`]**: Tool-server specs, rmcp stdio client, and the manager that routes calls
//! - **[`tools`]**: Typed wrappers: paper store, scraper, vector index, query log, filesystem
//! - **[`chunking`]**: Bounded, overlapping text splitter
//! - **[`llm`]**: Answer generation via OpenAI-compatible chat completions
//! - **[`phases`]**: Ingestion and query pipelines
//! - **[`runner`]**: Phase driver with guaranteed server teardown

pub mod chunking;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod mcp;
pub mod models;
pub mod phases;
pub mod runner;
pub mod tools;
