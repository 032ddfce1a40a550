//! `execute_python_code` — routes to the Code Sandbox Runner.
//!
//! As with `spawn_agent`, the actual sandbox lives in a separate crate that
//! depends on this one (to implement this trait) rather than the reverse, so
//! the handle is wired up once both sides exist.

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

#[async_trait::async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Runs `code` in captured mode and returns combined stdout/stderr text,
    /// or an error message (including the "Script exited with code N." form).
    async fn execute_python_code(&self, code: String) -> Result<String, String>;
}

pub type ExecutorHandle = Arc<RwLock<Option<Arc<dyn CodeExecutor>>>>;

pub fn create_executor_handle() -> ExecutorHandle {
    Arc::new(RwLock::new(None))
}

pub struct PythonExecTool {
    handle: ExecutorHandle,
}

impl PythonExecTool {
    pub fn new(handle: ExecutorHandle) -> Self {
        Self { handle }
    }
}

#[async_trait::async_trait]
impl Tool for PythonExecTool {
    fn name(&self) -> &str {
        "execute_python_code"
    }

    fn description(&self) -> &str {
        "Execute Python code in a fresh sandboxed directory. The code may call \
         registered tools through the generated `Tools` proxy class. Declare \
         third-party dependencies with a `# dependencies = [...]` comment or a \
         PEP 723 `# /// script` block; they are installed automatically."
    }

    fn prompt(&self) -> &str {
        "Use execute_python_code for multi-step data processing that is easier to \
         express as a script than as individual tool calls. Never hand-roll the \
         <tool_code_python> legacy format — always emit a JSON tool call here."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "description": "Python source to execute"}
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let code = match args.get("code").and_then(|v| v.as_str()) {
            Some(c) => c.to_string(),
            None => return ToolResult::error("Missing required parameter: code"),
        };

        let guard = self.handle.read().await;
        let executor = match guard.as_ref() {
            Some(e) => e.clone(),
            None => return ToolResult::error("Sandbox runner is not wired up yet"),
        };
        drop(guard);

        match executor.execute_python_code(code).await {
            Ok(output) => ToolResult::text(output),
            Err(e) => ToolResult::error(e),
        }
    }
}
