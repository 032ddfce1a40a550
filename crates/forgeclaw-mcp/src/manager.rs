//! Tool Server Manager: owns every configured MCP server connection and
//! dispatches tool calls to the right one.

use crate::server::McpServer;
use forgeclaw_core::{config::ToolServerConfig, ToolDescriptor, ToolResultEnvelope};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct McpManager {
    state: RwLock<State>,
}

struct State {
    servers: HashMap<String, Arc<McpServer>>,
    tool_patches: HashMap<String, serde_json::Value>,
    tool_to_server: HashMap<String, String>,
}

impl McpManager {
    pub fn new(config: ToolServerConfig) -> Self {
        Self { state: RwLock::new(Self::build_state(config)) }
    }

    fn build_state(config: ToolServerConfig) -> State {
        let mut servers = HashMap::new();
        for (name, server_config) in &config.mcp_servers {
            match McpServer::new(name.clone(), server_config) {
                Some(server) => {
                    servers.insert(name.clone(), Arc::new(server));
                }
                None => {
                    tracing::error!(server = %name, "invalid server config: no 'run' or 'command', disabling");
                }
            }
        }
        State { servers, tool_patches: config.tool_patches, tool_to_server: HashMap::new() }
    }

    /// Starts every configured server and runs the handshake + discovery.
    pub async fn startup(&self) {
        tracing::info!("tool server manager starting up");
        let state = self.state.read().await;
        let mut tool_to_server = HashMap::new();
        for (name, server) in &state.servers {
            if !server.start().await {
                continue;
            }
            if !server.handshake(&state.tool_patches).await {
                continue;
            }
            for tool in server.tools.lock().await.iter() {
                tool_to_server.insert(tool.name.clone(), name.clone());
            }
        }
        drop(state);
        self.state.write().await.tool_to_server = tool_to_server;
        tracing::info!("tool server manager startup complete");
    }

    /// Stops and re-creates every server connection from a new config, then
    /// runs startup again.
    pub async fn reload(&self, config: ToolServerConfig) {
        tracing::info!("tool server manager reloading");
        self.shutdown().await;
        *self.state.write().await = Self::build_state(config);
        self.startup().await;
        tracing::info!("tool server manager reload complete");
    }

    pub async fn shutdown(&self) {
        tracing::info!("tool server manager shutting down");
        let state = self.state.read().await;
        for server in state.servers.values() {
            server.stop().await;
        }
    }

    /// Descriptors for every tool discovered on a currently-running server.
    pub async fn get_all_tools_metadata(&self) -> Vec<ToolDescriptor> {
        let state = self.state.read().await;
        let mut all = Vec::new();
        for server in state.servers.values() {
            if server.is_running().await {
                all.extend(server.tools.lock().await.iter().cloned());
            }
        }
        all
    }

    /// Whether `name` is currently published by a running MCP server.
    pub async fn has_tool(&self, name: &str) -> bool {
        self.state.read().await.tool_to_server.contains_key(name)
    }

    pub async fn dispatch_tool_call(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> ToolResultEnvelope {
        let state = self.state.read().await;
        let Some(server_name) = state.tool_to_server.get(tool_name) else {
            return ToolResultEnvelope::error(format!("tool '{}' not found on any MCP server", tool_name));
        };
        let Some(server) = state.servers.get(server_name) else {
            return ToolResultEnvelope::error(format!("server '{}' not found", server_name));
        };
        let server = server.clone();
        drop(state);

        tracing::info!(tool = %tool_name, server = %server.name, "dispatching MCP tool call");
        match server.call_tool(tool_name, arguments).await {
            Ok(value) => ToolResultEnvelope::success(value),
            Err(e) => ToolResultEnvelope::error(e),
        }
    }
}
