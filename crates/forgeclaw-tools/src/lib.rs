//! Tool Registry — uniform metadata + dispatch table combining in-process
//! and (via the Tool Gateway / Tool Server Manager) child-process tools.

pub mod registry;
pub mod tools;

pub use registry::{Tool, ToolRegistry, ToolResult};
pub use tools::python_exec::{create_executor_handle, CodeExecutor, ExecutorHandle, PythonExecTool};
pub use tools::spawn::{create_spawn_handle, AgentSpawner, SpawnHandle, SpawnTool};

use forgeclaw_llm::LlmProvider;
use std::path::Path;
use std::sync::Arc;

/// Creates the default tool registry: file I/O, shell, the weather/multiply
/// reference tools, and the three agent-orchestration tools wired to the
/// handles the caller will fill in once the Agent Store and Sandbox Runner
/// exist (`create_spawn_handle`, `create_executor_handle`).
pub fn create_default_registry(
    workspace_root: impl AsRef<Path>,
    llm_provider: Arc<dyn LlmProvider>,
    model: impl Into<String>,
    temperature: f32,
    spawn_handle: SpawnHandle,
    executor_handle: ExecutorHandle,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    let root = workspace_root.as_ref();

    // --- Reference tools (file I/O, shell) ---
    registry.register(tools::read::ReadTool::new(root));
    registry.register(tools::glob::GlobTool::new(root));
    registry.register(tools::grep::GrepTool::new(root));
    registry.register(tools::write::WriteTool::new(root));
    registry.register(tools::edit::EditTool::new(root));
    registry.register(tools::bash::BashTool::new(root));

    // --- Reference tools used by the testable scenarios ---
    registry.register(tools::reference::WeatherTool);
    registry.register(tools::reference::MultiplyTool);

    // --- Agent-orchestration tools ---
    registry.register(SpawnTool::new(spawn_handle));
    registry.register(PythonExecTool::new(executor_handle));
    registry.register(tools::llm_request::LlmRequestTool::new(llm_provider, model, temperature));

    registry
}
