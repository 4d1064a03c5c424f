//! The two workflows. Each is a straight sequence of awaited collaborator
//! calls over a connected [`McpManager`](crate::mcp::McpManager).
pub mod ingest;
pub mod query;

pub use ingest::{IngestReport, IngestionPipeline};
pub use query::{NO_CONTEXT_ANSWER, QueryOutcome, QueryPipeline};
