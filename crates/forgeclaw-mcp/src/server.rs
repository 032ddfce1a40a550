//! A single MCP server connection: process lifecycle, JSON-RPC request/
//! response correlation over stdio, and tool discovery.

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use forgeclaw_core::{config::McpServerConfig, ToolDescriptor, ToolOrigin};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
const PROTOCOL_VERSION: &str = forgeclaw_core::MCP_PROTOCOL_VERSION;

struct Io {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// A single named MCP server: resolved launch command plus live process
/// state. All request/response traffic is serialized through `io` so
/// concurrent callers don't interleave on the shared stdio stream.
pub struct McpServer {
    pub name: String,
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    child: Mutex<Option<Child>>,
    io: Mutex<Option<Io>>,
    next_id: AtomicU64,
    pub tools: Mutex<Vec<ToolDescriptor>>,
}

impl McpServer {
    pub fn new(name: String, config: &McpServerConfig) -> Option<Self> {
        let (program, args, env) = config.resolve()?;
        Some(Self {
            name,
            program,
            args,
            env,
            child: Mutex::new(None),
            io: Mutex::new(None),
            next_id: AtomicU64::new(1),
            tools: Mutex::new(Vec::new()),
        })
    }

    /// Reaps the child non-blockingly so a process that crashed on its own
    /// (without `stop()` being called) is reported as not running, not just
    /// one this side has explicitly killed.
    pub async fn is_running(&self) -> bool {
        let mut child_guard = self.child.lock().await;
        let Some(child) = child_guard.as_mut() else { return false };
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::warn!(server = %self.name, ?status, "MCP server process exited unexpectedly");
                *child_guard = None;
                drop(child_guard);
                *self.io.lock().await = None;
                false
            }
            Ok(None) => true,
            Err(_) => true,
        }
    }

    /// Spawns the process. Returns false (logged) if the binary can't be found.
    pub async fn start(&self) -> bool {
        tracing::info!(server = %self.name, program = %self.program, "starting MCP server");

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        if !self.env.is_empty() {
            command.envs(&self.env);
        }

        let mut child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(server = %self.name, error = %e, "failed to start MCP server");
                return false;
            }
        };

        let stdin = match child.stdin.take() {
            Some(s) => s,
            None => return false,
        };
        let stdout = match child.stdout.take() {
            Some(s) => BufReader::new(s),
            None => return false,
        };
        if let Some(stderr) = child.stderr.take() {
            let name = self.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::warn!(server = %name, "{}", line);
                }
            });
        }

        *self.child.lock().await = Some(child);
        *self.io.lock().await = Some(Io { stdin, stdout });
        true
    }

    pub async fn stop(&self) {
        let mut child_guard = self.child.lock().await;
        if let Some(mut child) = child_guard.take() {
            tracing::info!(server = %self.name, "stopping MCP server");
            let _ = child.start_kill();
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await;
        }
        *self.io.lock().await = None;
    }

    async fn send_request(&self, method: &str, params: Option<Value>) -> Option<JsonRpcResponse> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let req = JsonRpcRequest::new(id, method, params);
        let mut line = serde_json::to_string(&req).ok()?;
        line.push('\n');

        let mut io_guard = self.io.lock().await;
        let io = io_guard.as_mut()?;
        if io.stdin.write_all(line.as_bytes()).await.is_err() || io.stdin.flush().await.is_err() {
            tracing::error!(server = %self.name, "failed to write to MCP server stdin");
            return None;
        }

        let read = async {
            loop {
                let mut resp_line = String::new();
                match io.stdout.read_line(&mut resp_line).await {
                    Ok(0) => return None,
                    Ok(_) => {
                        let trimmed = resp_line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<JsonRpcResponse>(trimmed) {
                            Ok(resp) if resp.id == Some(Value::from(id)) => return Some(resp),
                            Ok(_) => continue,
                            Err(_) => {
                                tracing::warn!(server = %self.name, "ignored non-JSON line from stdout");
                                continue;
                            }
                        }
                    }
                    Err(_) => return None,
                }
            }
        };

        match tokio::time::timeout(REQUEST_TIMEOUT, read).await {
            Ok(resp) => resp,
            Err(_) => {
                tracing::error!(server = %self.name, method, "timed out waiting for MCP response");
                None
            }
        }
    }

    async fn send_notification(&self, method: &str, params: Option<Value>) {
        let notif = JsonRpcNotification::new(method, params);
        let Ok(mut line) = serde_json::to_string(&notif) else { return };
        line.push('\n');
        let mut io_guard = self.io.lock().await;
        if let Some(io) = io_guard.as_mut() {
            let _ = io.stdin.write_all(line.as_bytes()).await;
            let _ = io.stdin.flush().await;
        }
    }

    /// Runs the `initialize` → `notifications/initialized` → paginated
    /// `tools/list` handshake. Stops the server and returns false on failure.
    pub async fn handshake(&self, tool_patches: &HashMap<String, Value>) -> bool {
        let init_params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {"name": "forgeclaw", "version": env!("CARGO_PKG_VERSION")},
            "capabilities": {},
        });

        let Some(resp) = self.send_request("initialize", Some(init_params)).await else {
            tracing::error!(server = %self.name, "initialize failed, shutting it down");
            self.stop().await;
            return false;
        };
        let Ok(result) = resp.into_result() else {
            tracing::error!(server = %self.name, "initialize returned an error, shutting it down");
            self.stop().await;
            return false;
        };

        self.send_notification("notifications/initialized", None).await;
        tracing::info!(server = %self.name, "MCP handshake complete");

        let tools_capable = result
            .get("capabilities")
            .and_then(|c| c.get("tools"))
            .is_some();
        if tools_capable {
            let tools = self.fetch_tools(tool_patches).await;
            *self.tools.lock().await = tools;
        }
        true
    }

    async fn fetch_tools(&self, tool_patches: &HashMap<String, Value>) -> Vec<ToolDescriptor> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor
                .as_ref()
                .map(|c| serde_json::json!({"cursor": c}))
                .or(Some(serde_json::json!({})));
            let Some(resp) = self.send_request("tools/list", params).await else {
                tracing::error!(server = %self.name, "failed to fetch tools/list");
                break;
            };
            let Ok(result) = resp.into_result() else {
                tracing::error!(server = %self.name, "tools/list returned an error");
                break;
            };
            let page = result
                .get("tools")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            for raw in page {
                let name = raw.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
                if name.is_empty() {
                    continue;
                }
                let mut descriptor = ToolDescriptor {
                    name: name.clone(),
                    description: raw.get("description").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                    input_schema: raw.get("inputSchema").cloned().unwrap_or(serde_json::json!({})),
                    output_schema: raw.get("outputSchema").cloned(),
                    origin: ToolOrigin::Mcp(self.name.clone()),
                };
                if let Some(patch) = tool_patches.get(&name) {
                    tracing::info!(server = %self.name, tool = %name, "patching tool metadata");
                    descriptor.apply_patch(patch);
                }
                all.push(descriptor);
            }
            cursor = result.get("nextCursor").and_then(|v| v.as_str()).map(|s| s.to_string());
            if cursor.is_none() {
                break;
            }
        }
        all
    }

    /// Forwards a `tools/call` request and returns the raw MCP result object.
    /// Every error mentions both `tool_name` and the server name, so a caller
    /// several layers up (the Kernel's tool-dispatch feedback, in particular)
    /// can tell which tool failed without needing to track dispatch context.
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<Value, String> {
        if !self.is_running().await {
            return Err(format!("tool '{}' on server '{}' is not running", tool_name, self.name));
        }
        let params = serde_json::json!({"name": tool_name, "arguments": arguments});
        let resp = self
            .send_request("tools/call", Some(params))
            .await
            .ok_or_else(|| format!("tool '{}' on server '{}': no response", tool_name, self.name))?;
        resp.into_result().map_err(|e| format!("tool '{}' on server '{}': {}", tool_name, self.name, e))
    }
}
