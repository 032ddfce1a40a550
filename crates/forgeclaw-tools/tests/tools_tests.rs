//! Tests for forgeclaw-tools: ToolResult, ToolRegistry, and all builtin tools

use forgeclaw_core::ToolResultEnvelope;
use forgeclaw_llm::StubProvider;
use forgeclaw_tools::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn test_workspace() -> PathBuf {
    let id = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_nanos();
    let dir = std::env::temp_dir().join(format!("forgeclaw-tools-test-{}-{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &std::path::Path) {
    let _ = std::fs::remove_dir_all(dir);
}

fn default_registry(ws: &std::path::Path) -> ToolRegistry {
    let provider: Arc<dyn forgeclaw_llm::LlmProvider> = Arc::new(StubProvider::new(Vec::<String>::new()));
    create_default_registry(ws, provider, "test-model", 0.7, create_spawn_handle(), create_executor_handle())
}

// ===========================================================================
// ToolResult
// ===========================================================================

#[test]
fn tool_result_text() {
    let r = ToolResult::text("hello");
    assert!(!r.is_error());
    assert_eq!(r.to_content_string(), "hello");
}

#[test]
fn tool_result_error() {
    let r = ToolResult::error("boom");
    assert!(r.is_error());
    assert_eq!(r.to_content_string(), "Error: boom");
}

#[test]
fn tool_result_to_envelope_success() {
    let env = ToolResult::Json(json!(42)).to_envelope();
    assert!(!env.is_error());
    assert_eq!(env.output().unwrap(), &json!(42));
}

#[test]
fn tool_result_to_envelope_error() {
    let env = ToolResult::error("boom").to_envelope();
    assert!(matches!(env, ToolResultEnvelope::Error { ref error } if error == "boom"));
}

// ===========================================================================
// ToolRegistry
// ===========================================================================

#[tokio::test]
async fn registry_default_is_empty() {
    let reg = ToolRegistry::new();
    assert!(reg.list().is_empty());
    assert!(reg.get_definitions().is_empty());
}

#[tokio::test]
async fn registry_execute_missing_tool() {
    let reg = ToolRegistry::new();
    let result = reg.execute("nonexistent", json!({})).await;
    assert!(result.is_error());
    assert!(result.to_content_string().contains("not found"));
}

#[tokio::test]
async fn create_default_registry_has_all_tools() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let names = reg.list();
    for expected in ["read", "write", "edit", "bash", "glob", "grep", "get_weather", "multiply_numbers", "spawn_agent", "execute_python_code", "llm_request"] {
        assert!(names.contains(&expected), "missing tool: {}", expected);
    }
    assert_eq!(names.len(), 11);
    cleanup(&ws);
}

#[tokio::test]
async fn registry_tool_has_schema() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    for def in reg.get_definitions() {
        assert!(!def.name.is_empty());
        assert!(!def.description.is_empty());
        assert!(def.input_schema.is_object());
    }
    cleanup(&ws);
}

// ===========================================================================
// Reference tools: get_weather / multiply_numbers
// ===========================================================================

#[tokio::test]
async fn weather_tool_london() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("get_weather", json!({"city": "London"})).await;
    assert!(!result.is_error());
    assert!(result.to_content_string().contains("London"));
    cleanup(&ws);
}

#[tokio::test]
async fn weather_tool_tokyo() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("get_weather", json!({"city": "Tokyo"})).await;
    assert!(!result.is_error());
    cleanup(&ws);
}

#[tokio::test]
async fn weather_tool_unknown_city_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("get_weather", json!({"city": "Paris"})).await;
    assert!(result.is_error());
    cleanup(&ws);
}

#[tokio::test]
async fn weather_tool_non_string_city_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("get_weather", json!({"city": 5})).await;
    assert!(result.is_error());
    cleanup(&ws);
}

#[tokio::test]
async fn multiply_tool_basic() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("multiply_numbers", json!({"a": 6, "b": 7})).await;
    assert!(!result.is_error());
    let env = result.to_envelope();
    assert_eq!(env.output().unwrap(), &json!(42));
    cleanup(&ws);
}

#[tokio::test]
async fn multiply_tool_non_numeric_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("multiply_numbers", json!({"a": "x", "b": 7})).await;
    assert!(result.is_error());
    cleanup(&ws);
}

// ===========================================================================
// WriteTool / ReadTool / EditTool — real filesystem
// ===========================================================================

#[tokio::test]
async fn write_tool_creates_file() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("write", json!({"path": "test_write.txt", "content": "hello world"})).await;
    assert!(!result.is_error(), "Write failed: {}", result.to_content_string());
    let content = std::fs::read_to_string(ws.join("test_write.txt")).unwrap();
    assert_eq!(content, "hello world");
    cleanup(&ws);
}

#[tokio::test]
async fn read_tool_reads_file() {
    let ws = test_workspace();
    std::fs::write(ws.join("readable.txt"), "line1\nline2\nline3").unwrap();
    let reg = default_registry(&ws);
    let result = reg.execute("read", json!({"path": "readable.txt"})).await;
    assert!(!result.is_error());
    assert!(result.to_content_string().contains("line1"));
    cleanup(&ws);
}

#[tokio::test]
async fn edit_tool_replaces_text() {
    let ws = test_workspace();
    std::fs::write(ws.join("editable.txt"), "hello world").unwrap();
    let reg = default_registry(&ws);
    let result = reg.execute("edit", json!({"path": "editable.txt", "old_string": "world", "new_string": "forgeclaw"})).await;
    assert!(!result.is_error());
    let content = std::fs::read_to_string(ws.join("editable.txt")).unwrap();
    assert_eq!(content, "hello forgeclaw");
    cleanup(&ws);
}

#[tokio::test]
async fn exec_tool_runs_command() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("bash", json!({"command": "echo hello"})).await;
    assert!(!result.is_error());
    assert_eq!(result.to_content_string(), "hello");
    cleanup(&ws);
}

// ===========================================================================
// spawn_agent — via a stub AgentSpawner
// ===========================================================================

struct StubSpawner;

#[async_trait::async_trait]
impl AgentSpawner for StubSpawner {
    async fn spawn_agent(&self, role: String, _prompt: String) -> Result<String, String> {
        Ok(format!("agent-for-{}", role))
    }
}

#[tokio::test]
async fn spawn_agent_unwired_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("spawn_agent", json!({"role": "W", "prompt": "do X"})).await;
    assert!(result.is_error());
    assert!(result.to_content_string().contains("not wired"));
    cleanup(&ws);
}

#[tokio::test]
async fn spawn_agent_dispatches_through_handle() {
    let ws = test_workspace();
    let spawn_handle = create_spawn_handle();
    *spawn_handle.write().await = Some(Arc::new(StubSpawner));
    let provider: Arc<dyn forgeclaw_llm::LlmProvider> = Arc::new(StubProvider::new(Vec::<String>::new()));
    let reg = create_default_registry(&ws, provider, "m", 0.7, spawn_handle, create_executor_handle());
    let result = reg.execute("spawn_agent", json!({"role": "W", "prompt": "do X"})).await;
    assert!(!result.is_error());
    assert_eq!(result.to_content_string(), "agent-for-W");
    cleanup(&ws);
}

#[tokio::test]
async fn spawn_agent_missing_role_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("spawn_agent", json!({"prompt": "do X"})).await;
    assert!(result.is_error());
    cleanup(&ws);
}

// ===========================================================================
// execute_python_code — via a stub CodeExecutor
// ===========================================================================

struct StubExecutor;

#[async_trait::async_trait]
impl CodeExecutor for StubExecutor {
    async fn execute_python_code(&self, code: String) -> Result<String, String> {
        if code.contains("fail") {
            Err("Script exited with code 1.".to_string())
        } else {
            Ok("printed output".to_string())
        }
    }
}

#[tokio::test]
async fn execute_python_code_unwired_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("execute_python_code", json!({"code": "print(1)"})).await;
    assert!(result.is_error());
    cleanup(&ws);
}

#[tokio::test]
async fn execute_python_code_dispatches_through_handle() {
    let ws = test_workspace();
    let executor_handle = create_executor_handle();
    *executor_handle.write().await = Some(Arc::new(StubExecutor));
    let provider: Arc<dyn forgeclaw_llm::LlmProvider> = Arc::new(StubProvider::new(Vec::<String>::new()));
    let reg = create_default_registry(&ws, provider, "m", 0.7, create_spawn_handle(), executor_handle);

    let ok = reg.execute("execute_python_code", json!({"code": "print(1)"})).await;
    assert!(!ok.is_error());
    assert_eq!(ok.to_content_string(), "printed output");

    let failing = reg.execute("execute_python_code", json!({"code": "fail()"})).await;
    assert!(failing.is_error());
    cleanup(&ws);
}

// ===========================================================================
// llm_request — via StubProvider
// ===========================================================================

#[tokio::test]
async fn llm_request_returns_scripted_completion() {
    let ws = test_workspace();
    let provider: Arc<dyn forgeclaw_llm::LlmProvider> = Arc::new(StubProvider::new(["scripted reply"]));
    let reg = create_default_registry(&ws, provider, "m", 0.7, create_spawn_handle(), create_executor_handle());
    let result = reg.execute("llm_request", json!({"prompt": "side query"})).await;
    assert!(!result.is_error());
    assert_eq!(result.to_content_string(), "scripted reply");
    cleanup(&ws);
}

#[tokio::test]
async fn llm_request_sends_a_single_shot_system_and_user_history() {
    let ws = test_workspace();
    let stub = Arc::new(StubProvider::new(["scripted reply"]));
    let provider: Arc<dyn forgeclaw_llm::LlmProvider> = stub.clone();
    let reg = create_default_registry(&ws, provider, "m", 0.7, create_spawn_handle(), create_executor_handle());

    reg.execute("llm_request", json!({"prompt": "side query"})).await;

    let history = stub.last_history().expect("provider was called");
    assert_eq!(history.len(), 2, "expected system + user only, no shared history");
    assert_eq!(history[0].role, forgeclaw_core::Role::System);
    assert_eq!(history[1].role, forgeclaw_core::Role::User);
    assert_eq!(history[1].content, "side query");
    cleanup(&ws);
}

#[tokio::test]
async fn llm_request_missing_prompt_errors() {
    let ws = test_workspace();
    let reg = default_registry(&ws);
    let result = reg.execute("llm_request", json!({})).await;
    assert!(result.is_error());
    cleanup(&ws);
}
