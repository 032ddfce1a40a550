//! Tool Gateway: the single HTTP surface the Code Sandbox Runner's generated
//! proxy scripts call into to invoke a tool (internal or MCP) by name.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use forgeclaw_core::{GatewayConfig, ToolResultEnvelope};
use forgeclaw_mcp::McpManager;
use forgeclaw_tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub struct GatewayState {
    pub mcp_manager: Arc<McpManager>,
    pub registry: Arc<ToolRegistry>,
}

#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    tool_name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct GatewayResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl GatewayResponse {
    fn success(result: Value) -> (StatusCode, Json<Self>) {
        (StatusCode::OK, Json(Self { status: "success", result: Some(result), error_type: None, message: None }))
    }

    fn error(code: StatusCode, error_type: &'static str, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (code, Json(Self { status: "error", result: None, error_type: Some(error_type), message: Some(message.into()) }))
    }
}

pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/mcp_tool_call", post(mcp_tool_call_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &GatewayConfig, state: Arc<GatewayState>) -> std::io::Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = config
        .to_addr()
        .parse()
        .expect("gateway bind address must be a valid host:port");
    info!("tool gateway listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// Routes a call by tool name: the MCP name→server map first, then the
/// internal registry, else 404. Successful results are normalized into the
/// MCP-style `{content:[{type:"text",text}], isError}` shape used by both
/// dispatch paths. Deliberately has no request access log at `info` — only
/// `tracing`'s span machinery at `debug` — per the transport being a
/// loopback-only implementation detail of the sandbox, not a public surface.
async fn mcp_tool_call_handler(
    State(state): State<Arc<GatewayState>>,
    body: Result<Json<ToolCallRequest>, axum::extract::rejection::JsonRejection>,
) -> (StatusCode, Json<GatewayResponse>) {
    let Json(req) = match body {
        Ok(j) => j,
        Err(e) => {
            return GatewayResponse::error(
                StatusCode::BAD_REQUEST,
                "INVALID_TOOL_ARGUMENTS",
                format!("invalid request body: {}", e),
            )
        }
    };

    let mcp_tools = state.mcp_manager.get_all_tools_metadata().await;
    let served_by_mcp = mcp_tools.iter().any(|t| t.name == req.tool_name);

    if served_by_mcp {
        tracing::debug!(tool = %req.tool_name, "gateway dispatching to MCP tool");
        return match state.mcp_manager.dispatch_tool_call(&req.tool_name, req.arguments).await {
            ToolResultEnvelope::Success { output } => {
                GatewayResponse::success(output.unwrap_or_else(|| json!({"content": [], "isError": false})))
            }
            ToolResultEnvelope::Error { error } => {
                GatewayResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "TOOL_EXECUTION_ERROR", error)
            }
        };
    }

    if state.registry.get(&req.tool_name).is_some() {
        tracing::debug!(tool = %req.tool_name, "gateway dispatching to internal tool");
        let result = state.registry.execute(&req.tool_name, req.arguments).await;
        let normalized = json!({
            "content": [{"type": "text", "text": result.to_content_string()}],
            "isError": result.is_error(),
        });
        return GatewayResponse::success(normalized);
    }

    GatewayResponse::error(StatusCode::NOT_FOUND, "TOOL_NOT_FOUND", format!("Tool '{}' not found.", req.tool_name))
}
