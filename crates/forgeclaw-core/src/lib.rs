pub mod config;
pub mod error;
pub mod types;

pub use config::{GatewayConfig, McpServerConfig, OrchestratorConfig, ToolServerConfig};
pub use error::{Error, Result};
pub use types::{
    Agent, AgentId, AgentStatus, Message, Role, ToolCall, ToolCallResult, ToolDescriptor,
    ToolOrigin, ToolResultEnvelope,
};

/// JSON-RPC protocol version exchanged during `initialize` with child tool servers.
pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

/// Default start/end delimiters for the tool block in an assistant response.
pub const TOOL_TAG_START: &str = "<tool>";
pub const TOOL_TAG_END: &str = "</tool>";
