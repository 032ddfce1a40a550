//! Tests for the Tool Server Manager: JSON-RPC wire shapes plus an
//! end-to-end run against a tiny real `sh` subprocess standing in for an
//! MCP server.

use forgeclaw_core::config::{McpServerConfig, ToolServerConfig};
use forgeclaw_core::ToolOrigin;
use forgeclaw_mcp::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use forgeclaw_mcp::McpManager;
use serde_json::json;
use std::collections::HashMap;

// A minimal stand-in MCP server: a shell one-liner that pattern-matches on
// the method name in each JSON-RPC line and prints back a canned response.
// Grounded on the teacher's own preference for exercising real child
// processes in tests rather than mocking subprocess I/O.
const STUB_SERVER_SCRIPT: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *'"method":"initialize"'*)
      id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
      printf '{"jsonrpc":"2.0","id":%s,"result":{"serverInfo":{"name":"stub"},"capabilities":{"tools":{}}}}\n' "$id"
      ;;
    *'"method":"notifications/initialized"'*)
      ;;
    *'"method":"tools/list"'*)
      id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echoes input","inputSchema":{"type":"object"}}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"ok"}],"isError":false}}\n' "$id"
      ;;
  esac
done
"#;

// Same handshake as STUB_SERVER_SCRIPT, but exits right after answering
// `tools/list` instead of looping forever, so the tool is registered and
// then the process dies on its own before any `tools/call` arrives.
const DYING_STUB_SERVER_SCRIPT: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *'"method":"initialize"'*)
      id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
      printf '{"jsonrpc":"2.0","id":%s,"result":{"serverInfo":{"name":"stub"},"capabilities":{"tools":{}}}}\n' "$id"
      ;;
    *'"method":"notifications/initialized"'*)
      ;;
    *'"method":"tools/list"'*)
      id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echoes input","inputSchema":{"type":"object"}}]}}\n' "$id"
      exit 0
      ;;
  esac
done
"#;

fn dying_stub_config() -> ToolServerConfig {
    let mut mcp_servers = HashMap::new();
    mcp_servers.insert(
        "stub".to_string(),
        McpServerConfig {
            run: None,
            command: Some("sh".to_string()),
            args: vec!["-c".to_string(), DYING_STUB_SERVER_SCRIPT.to_string()],
            env: HashMap::new(),
        },
    );
    ToolServerConfig { mcp_servers, tool_patches: HashMap::new() }
}

fn stub_config() -> ToolServerConfig {
    let mut mcp_servers = HashMap::new();
    mcp_servers.insert(
        "stub".to_string(),
        McpServerConfig {
            run: None,
            command: Some("sh".to_string()),
            args: vec!["-c".to_string(), STUB_SERVER_SCRIPT.to_string()],
            env: HashMap::new(),
        },
    );
    ToolServerConfig { mcp_servers, tool_patches: HashMap::new() }
}

// ===========================================================================
// JSON-RPC wire shapes
// ===========================================================================

#[test]
fn request_omits_params_when_none() {
    let req = JsonRpcRequest::new(1, "tools/list", None);
    let s = serde_json::to_string(&req).unwrap();
    assert!(s.contains("\"method\":\"tools/list\""));
    assert!(!s.contains("params"));
}

#[test]
fn request_includes_params_when_present() {
    let req = JsonRpcRequest::new(2, "tools/call", Some(json!({"name": "echo"})));
    let s = serde_json::to_string(&req).unwrap();
    assert!(s.contains("\"params\""));
    assert!(s.contains("\"name\":\"echo\""));
}

#[test]
fn notification_has_no_id_field() {
    let notif = JsonRpcNotification::new("notifications/initialized", None);
    let s = serde_json::to_string(&notif).unwrap();
    assert!(!s.contains("\"id\""));
}

#[test]
fn response_into_result_unwraps_success() {
    let resp: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#).unwrap();
    let result = resp.into_result().unwrap();
    assert_eq!(result["ok"], json!(true));
}

#[test]
fn response_into_result_surfaces_error() {
    let resp: JsonRpcResponse =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"not found"}}"#).unwrap();
    assert!(resp.into_result().is_err());
}

// ===========================================================================
// McpManager end-to-end against a real subprocess
// ===========================================================================

#[tokio::test]
async fn manager_discovers_and_dispatches_tools() {
    let manager = McpManager::new(stub_config());
    manager.startup().await;

    let tools = manager.get_all_tools_metadata().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "echo");
    assert!(matches!(&tools[0].origin, ToolOrigin::Mcp(name) if name == "stub"));

    let result = manager.dispatch_tool_call("echo", json!({"text": "hi"})).await;
    assert!(!result.is_error());

    manager.shutdown().await;
}

#[tokio::test]
async fn manager_dispatch_unknown_tool_errors() {
    let manager = McpManager::new(stub_config());
    manager.startup().await;

    let result = manager.dispatch_tool_call("does_not_exist", json!({})).await;
    assert!(result.is_error());

    manager.shutdown().await;
}

#[tokio::test]
async fn manager_with_invalid_server_config_skips_it() {
    let mut mcp_servers = HashMap::new();
    mcp_servers.insert(
        "broken".to_string(),
        McpServerConfig { run: None, command: None, args: vec![], env: HashMap::new() },
    );
    let manager = McpManager::new(ToolServerConfig { mcp_servers, tool_patches: HashMap::new() });
    manager.startup().await;
    assert!(manager.get_all_tools_metadata().await.is_empty());
    manager.shutdown().await;
}

#[tokio::test]
async fn manager_dispatch_to_dead_server_error_names_the_tool() {
    let manager = McpManager::new(dying_stub_config());
    manager.startup().await;

    let tools = manager.get_all_tools_metadata().await;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "echo");

    // The handshake already returned before the server exited; give the
    // process a moment to actually finish dying before the next call.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let result = manager.dispatch_tool_call("echo", json!({"text": "hi"})).await;
    assert!(result.is_error());
    let serialized = serde_json::to_value(&result).unwrap();
    let message = serialized["error"].as_str().unwrap();
    assert!(message.contains("echo"), "error should name the dead tool, got: {}", message);

    manager.shutdown().await;
}

#[tokio::test]
async fn manager_applies_tool_patches() {
    let mut config = stub_config();
    config.tool_patches.insert("echo".to_string(), json!({"description": "patched description"}));
    let manager = McpManager::new(config);
    manager.startup().await;

    let tools = manager.get_all_tools_metadata().await;
    assert_eq!(tools[0].description, "patched description");

    manager.shutdown().await;
}
