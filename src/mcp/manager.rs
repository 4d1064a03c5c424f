/// Registry of connected tool servers.
///
/// Servers are started one after another by [`McpManager::connect`]. Callers
/// must finish with [`McpManager::shutdown`]; the phase driver does so on every
/// exit path.
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::error::ToolError;
use crate::mcp::{JsonObject, ServerLauncher, ServerName, ServerSpec, ToolClient, ToolOutput};

struct ConnectedServer {
    client: Box<dyn ToolClient>,
    operations: HashSet<String>,
}

pub struct McpManager {
    servers: BTreeMap<ServerName, ConnectedServer>,
    call_timeout: Duration,
}

impl McpManager {
    /// Start every server in `specs`, in order.
    ///
    /// Listing a server's operations is bounded by `timeouts.server_start`,
    /// like the launch itself. If one server fails, the servers already
    /// started are shut down before the error is returned.
    pub async fn connect(
        specs: &[ServerSpec],
        launcher: &dyn ServerLauncher,
        timeouts: &Timeouts,
    ) -> Result<Self, ToolError> {
        let mut manager = Self {
            servers: BTreeMap::new(),
            call_timeout: timeouts.tool_call,
        };

        for spec in specs {
            match Self::start_one(spec, launcher, timeouts.server_start).await {
                Ok(server) => {
                    info!(
                        "Connected to {} server ({} operations)",
                        spec.name,
                        server.operations.len()
                    );
                    manager.servers.insert(spec.name, server);
                }
                Err(e) => {
                    warn!("Failed to start {} server: {e}", spec.name);
                    manager.shutdown().await;
                    return Err(e);
                }
            }
        }

        Ok(manager)
    }

    async fn start_one(
        spec: &ServerSpec,
        launcher: &dyn ServerLauncher,
        start_timeout: Duration,
    ) -> Result<ConnectedServer, ToolError> {
        let client = launcher.launch(spec).await?;
        let listed = tokio::time::timeout(start_timeout, client.list_operations())
            .await
            .unwrap_or_else(|_| {
                Err(ToolError::StartTimeout {
                    server: spec.name,
                    secs: start_timeout.as_secs(),
                })
            });

        match listed {
            Ok(ops) => Ok(ConnectedServer {
                client,
                operations: ops.into_iter().collect(),
            }),
            Err(e) => {
                if let Err(stop_err) = client.shutdown().await {
                    debug!("Shutdown after failed tool listing: {stop_err}");
                }
                Err(e)
            }
        }
    }

    /// Names of the connected servers.
    #[must_use]
    pub fn servers(&self) -> Vec<ServerName> {
        self.servers.keys().copied().collect()
    }

    /// Invoke `operation` on `server`.
    ///
    /// Fails without calling the server when the operation is not advertised.
    /// A result flagged `isError` becomes [`ToolError::Reported`].
    pub async fn invoke(
        &self,
        server: ServerName,
        operation: &str,
        arguments: JsonObject,
    ) -> Result<ToolOutput, ToolError> {
        let connected = self
            .servers
            .get(&server)
            .ok_or(ToolError::NotConnected(server))?;

        if !connected.operations.contains(operation) {
            return Err(ToolError::UnknownOperation {
                server,
                operation: operation.to_string(),
            });
        }

        debug!("→ {server}.{operation}");
        let output = tokio::time::timeout(self.call_timeout, connected.client.call(operation, arguments))
            .await
            .map_err(|_| ToolError::Timeout {
                server,
                operation: operation.to_string(),
                secs: self.call_timeout.as_secs(),
            })??;

        if output.is_error {
            return Err(ToolError::Reported {
                server,
                operation: operation.to_string(),
                message: output.text,
            });
        }
        Ok(output)
    }

    /// Like [`invoke`](Self::invoke) but takes the arguments as a JSON value,
    /// which must be an object.
    pub async fn invoke_json(
        &self,
        server: ServerName,
        operation: &str,
        arguments: Value,
    ) -> Result<ToolOutput, ToolError> {
        match arguments {
            Value::Object(map) => self.invoke(server, operation, map).await,
            other => Err(ToolError::Decode {
                server,
                operation: operation.to_string(),
                message: format!("arguments must be a JSON object, got {other}"),
            }),
        }
    }

    /// Stop every server. Failures are logged, never returned.
    pub async fn shutdown(self) {
        for (name, server) in self.servers {
            match server.client.shutdown().await {
                Ok(()) => info!("Disconnected from {name}"),
                Err(e) => warn!("Failed to stop {name} server cleanly: {e}"),
            }
        }
    }
}
