//! Error taxonomy.
//!
//! Per-paper failures never surface here: the ingestion phase swallows and
//! counts them. Everything below is fatal to the phase that hit it.
use thiserror::Error;

use crate::config::Phase;
use crate::mcp::ServerName;

/// Failures talking to a tool server.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start {server} server: {message}")]
    StartFailed { server: ServerName, message: String },

    #[error("{server} server did not finish its handshake within {secs}s")]
    StartTimeout { server: ServerName, secs: u64 },

    #[error("{0} server is not connected")]
    NotConnected(ServerName),

    #[error("{server} server has no operation named {operation:?}")]
    UnknownOperation {
        server: ServerName,
        operation: String,
    },

    #[error("{server}.{operation} timed out after {secs}s")]
    Timeout {
        server: ServerName,
        operation: String,
        secs: u64,
    },

    #[error("{server}.{operation} transport error: {message}")]
    Transport {
        server: ServerName,
        operation: String,
        message: String,
    },

    #[error("{server}.{operation} reported an error: {message}")]
    Reported {
        server: ServerName,
        operation: String,
        message: String,
    },

    #[error("{server}.{operation} returned an unexpected payload: {message}")]
    Decode {
        server: ServerName,
        operation: String,
        message: String,
    },
}

/// Failures from the text generation endpoint.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation endpoint returned no answer")]
    EmptyResponse,
}

/// A fatal failure inside one phase.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Top-level failure of a run. Configuration errors are raised before a run
/// starts and stay [`ConfigError`](crate::config::ConfigError)s.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("tool servers unavailable: {0}")]
    Startup(#[source] ToolError),

    #[error("{phase} phase failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: PhaseError,
    },

    #[error("interrupted")]
    Interrupted,
}

impl AgentError {
    pub(crate) fn in_phase(phase: Phase) -> impl FnOnce(PhaseError) -> Self {
        move |source| AgentError::Phase { phase, source }
    }
}
