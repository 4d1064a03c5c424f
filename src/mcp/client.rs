/// Live tool-server handles.
///
/// [`ToolClient`] is one connected server; [`ServerLauncher`] starts one from
/// its [`ServerSpec`]. The production launcher spawns the server as a child
/// process and speaks MCP over its stdio using `rmcp`.
use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    service::{RoleClient, RunningService},
    transport::TokioChildProcess,
};
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ToolError;
use crate::mcp::{JsonObject, ServerName, ServerSpec, ToolOutput};

/// A connected tool server.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Names of the operations the server advertises.
    async fn list_operations(&self) -> Result<Vec<String>, ToolError>;

    /// Invoke one operation. Timeouts are applied by the caller.
    async fn call(&self, operation: &str, arguments: JsonObject) -> Result<ToolOutput, ToolError>;

    /// Stop the server and release its process.
    async fn shutdown(self: Box<Self>) -> Result<(), ToolError>;
}

/// Starts tool servers.
#[async_trait]
pub trait ServerLauncher: Send + Sync {
    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ToolClient>, ToolError>;
}

// ── Child-process launcher ───────────────────────────────────────────

/// Spawns each server as a child process and completes the MCP handshake.
#[derive(Debug, Clone)]
pub struct StdioLauncher {
    pub start_timeout: Duration,
}

impl StdioLauncher {
    #[must_use]
    pub fn new(start_timeout: Duration) -> Self {
        Self { start_timeout }
    }
}

#[async_trait]
impl ServerLauncher for StdioLauncher {
    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ToolClient>, ToolError> {
        info!("Starting {} server: {}", spec.name, spec.command_line());

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args).envs(&spec.env);

        let transport = TokioChildProcess::new(cmd).map_err(|e| ToolError::StartFailed {
            server: spec.name,
            message: e.to_string(),
        })?;

        let service = tokio::time::timeout(self.start_timeout, ().serve(transport))
            .await
            .map_err(|_| ToolError::StartTimeout {
                server: spec.name,
                secs: self.start_timeout.as_secs(),
            })?
            .map_err(|e| ToolError::StartFailed {
                server: spec.name,
                message: e.to_string(),
            })?;

        debug!("{} server handshake complete", spec.name);

        Ok(Box::new(RmcpToolClient {
            name: spec.name,
            service,
        }))
    }
}

/// An rmcp client session over a child process.
struct RmcpToolClient {
    name: ServerName,
    service: RunningService<RoleClient, ()>,
}

impl RmcpToolClient {
    fn transport_error(&self, operation: &str, message: impl ToString) -> ToolError {
        ToolError::Transport {
            server: self.name,
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ToolClient for RmcpToolClient {
    async fn list_operations(&self) -> Result<Vec<String>, ToolError> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| self.transport_error("tools/list", e))?;
        Ok(tools.into_iter().map(|t| t.name.to_string()).collect())
    }

    async fn call(&self, operation: &str, arguments: JsonObject) -> Result<ToolOutput, ToolError> {
        // Params go through their wire form; optional fields stay unset.
        let params = serde_json::from_value(json!({
            "name": operation,
            "arguments": arguments,
        }))
        .map_err(|e| self.transport_error(operation, e))?;

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| self.transport_error(operation, e))?;

        let wire = serde_json::to_value(&result).map_err(|e| ToolError::Decode {
            server: self.name,
            operation: operation.to_string(),
            message: e.to_string(),
        })?;
        Ok(ToolOutput::from_wire(&wire))
    }

    async fn shutdown(self: Box<Self>) -> Result<(), ToolError> {
        let name = self.name;
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| ToolError::Transport {
                server: name,
                operation: "shutdown".to_string(),
                message: e.to_string(),
            })?;
        debug!("{name} server stopped: {reason:?}");
        Ok(())
    }
}
