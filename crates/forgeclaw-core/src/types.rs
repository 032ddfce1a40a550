use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Interned agent identifier. The root agent always has the id `"main"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(Arc<str>);

impl AgentId {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    pub const MAIN: &'static str = "main";

    pub fn main() -> Self {
        Self(Arc::from(Self::MAIN))
    }

    pub fn is_main(&self) -> bool {
        self.0.as_ref() == Self::MAIN
    }

    /// Generates a fresh child agent id, `agent-<8 hex chars>`.
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(Arc::from(format!("agent-{}", &hex[..8])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Message role. The data model fixes exactly these three; tool-execution
/// feedback is carried as a `user`-role message, matching the convention
/// that the model only ever sees `system`/`user`/`assistant` turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Ready,
    Running,
    Waiting,
    Done,
    Error,
}

/// A conversation participant with a history and a status, driven by the Kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub role: String,
    pub history: Vec<Message>,
    pub status: AgentStatus,
    pub result: Option<String>,
    pub parent_id: Option<AgentId>,
    pub is_main: bool,
}

impl Agent {
    /// Builds a new agent context. `initial_prompt`, when present, is appended
    /// to history as a user message after the mandatory leading system message.
    pub fn new(
        id: AgentId,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
        initial_prompt: Option<&str>,
        parent_id: Option<AgentId>,
        is_main: bool,
    ) -> Self {
        let mut history = vec![Message::system(system_prompt)];
        if let Some(p) = initial_prompt {
            if !p.is_empty() {
                history.push(Message::user(p));
            }
        }
        Self {
            id,
            role: role.into(),
            history,
            status: if is_main { AgentStatus::Done } else { AgentStatus::Ready },
            result: None,
            parent_id,
            is_main,
        }
    }
}

/// Tag identifying where a tool came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOrigin {
    Internal,
    Mcp(String),
    AgentOrchestration,
    CodeExec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    pub origin: ToolOrigin,
}

impl ToolDescriptor {
    /// Tool method name as used by the generated sandbox proxy: `/` and `-` replaced with `_`.
    pub fn sanitized_name(&self) -> String {
        self.name.replace(['/', '-'], "_")
    }

    /// Shallow merge of a `tool_patches` entry: only fields present in `patch` are overridden.
    pub fn apply_patch(&mut self, patch: &serde_json::Value) {
        let Some(obj) = patch.as_object() else { return };
        if let Some(v) = obj.get("description").and_then(|v| v.as_str()) {
            self.description = v.to_string();
        }
        if let Some(v) = obj.get("input_schema") {
            self.input_schema = v.clone();
        }
        if let Some(v) = obj.get("output_schema") {
            self.output_schema = Some(v.clone());
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCall {
    #[serde(default)]
    pub call_id: Option<String>,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// `{status: "success" | "error", output?, error?}` — the uniform result shape
/// emitted by both the Kernel and the Gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolResultEnvelope {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<serde_json::Value>,
    },
    Error {
        error: String,
    },
}

impl ToolResultEnvelope {
    pub fn success(output: serde_json::Value) -> Self {
        Self::Success { output: Some(output) }
    }

    pub fn success_empty() -> Self {
        Self::Success { output: None }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { error: msg.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn output(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Success { output } => output.as_ref(),
            Self::Error { .. } => None,
        }
    }
}

/// One entry of the `{call_id, result}` list rendered into a `TOOL_EXECUTION_RESULT` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub result: ToolResultEnvelope,
}
