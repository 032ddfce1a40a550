//! `spawn_agent` — creates a child agent via the Agent Store.
//!
//! `forgeclaw-tools` cannot depend on `forgeclaw-agent` (the Agent Store and
//! Kernel live there and themselves depend on the tool registry), so the
//! actual spawn is reached through a small trait plus a handle set after
//! construction, breaking the circular dependency the same way the upstream
//! runtime/tools split does for its own spawn tool.

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Implemented by whatever owns the Agent Store. `spawn_agent` captures the
/// current system-prompt generator at call time (§9 Design Notes), so the
/// implementation — not this tool — is responsible for building the new
/// agent's initial system message.
#[async_trait::async_trait]
pub trait AgentSpawner: Send + Sync {
    async fn spawn_agent(&self, role: String, prompt: String) -> Result<String, String>;
}

pub type SpawnHandle = Arc<RwLock<Option<Arc<dyn AgentSpawner>>>>;

pub fn create_spawn_handle() -> SpawnHandle {
    Arc::new(RwLock::new(None))
}

pub struct SpawnTool {
    handle: SpawnHandle,
}

impl SpawnTool {
    pub fn new(handle: SpawnHandle) -> Self {
        Self { handle }
    }
}

#[async_trait::async_trait]
impl Tool for SpawnTool {
    fn name(&self) -> &str {
        "spawn_agent"
    }

    fn description(&self) -> &str {
        "Spawn a child agent with its own role and initial instructions. \
         Returns the new agent's id; use wait_for_agents to block on it."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "role": {"type": "string", "description": "Human label for the child agent"},
                "prompt": {"type": "string", "description": "Initial instructions for the child agent"}
            },
            "required": ["role", "prompt"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let role = match args.get("role").and_then(|v| v.as_str()) {
            Some(r) => r.to_string(),
            None => return ToolResult::error("Missing required parameter: role"),
        };
        let prompt = match args.get("prompt").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => return ToolResult::error("Missing required parameter: prompt"),
        };

        let guard = self.handle.read().await;
        let spawner = match guard.as_ref() {
            Some(s) => s.clone(),
            None => return ToolResult::error("Agent store is not wired up yet"),
        };
        drop(guard);

        match spawner.spawn_agent(role, prompt).await {
            Ok(id) => ToolResult::Json(json!(id)),
            Err(e) => ToolResult::error(e),
        }
    }
}
