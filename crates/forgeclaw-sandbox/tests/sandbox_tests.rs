use forgeclaw_core::{ToolDescriptor, ToolOrigin};
use forgeclaw_sandbox::deps::process_tool_code;
use forgeclaw_sandbox::proxy::generate_tools_file_content;
use forgeclaw_sandbox::SandboxRunner;
use forgeclaw_tools::CodeExecutor;
use serde_json::json;

fn sample_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "get_weather".to_string(),
            description: "Fetch the current weather for a city.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
            output_schema: None,
            origin: ToolOrigin::Internal,
        },
        ToolDescriptor {
            name: "multiply".to_string(),
            description: "Multiply two numbers.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                "required": ["a", "b"]
            }),
            output_schema: Some(json!({"type": "number"})),
            origin: ToolOrigin::Internal,
        },
    ]
}

// === deps::process_tool_code ===

#[test]
fn process_tool_code_leaves_plain_code_untouched() {
    let code = "print('hello')";
    assert_eq!(process_tool_code(code), "print('hello')");
}

#[test]
fn process_tool_code_merges_fenced_script_block() {
    let code = "# /// script\n# dependencies = [\"requests\"]\n# ///\nimport requests\nprint(requests)";
    let result = process_tool_code(code);
    assert!(result.starts_with("# /// script\n# dependencies = "));
    assert!(result.contains("\"requests\""));
    assert!(result.contains("import requests"));
    assert!(!result.contains("# /// script\n# dependencies = [\"requests\"]\n# ///\nimport"));
}

#[test]
fn process_tool_code_last_script_block_wins() {
    let code = "# /// script\n# dependencies = [\"numpy\"]\n# ///\n# /// script\n# dependencies = [\"pandas\"]\n# ///\nprint(1)";
    let result = process_tool_code(code);
    assert!(result.contains("pandas"));
    assert!(!result.contains("numpy"));
}

#[test]
fn process_tool_code_collects_single_line_dependency_comments() {
    let code = "# dependencies = [\"pyyaml\"]\nimport yaml\nprint(yaml)";
    let result = process_tool_code(code);
    assert!(result.contains("pyyaml"));
    assert!(!result.contains("# dependencies = [\"pyyaml\"]\nimport"));
}

#[test]
fn process_tool_code_infers_dependency_from_plain_import() {
    let code = "import numpy\nprint(numpy.array([1]))";
    let result = process_tool_code(code);
    assert!(result.contains("numpy"));
}

#[test]
fn process_tool_code_injects_tools_import_when_missing() {
    let code = "result = Tools.get_weather(city=\"London\")\nprint(result)";
    let result = process_tool_code(code);
    assert!(result.contains("from tools import Tools, MCPToolError"));
    assert!(result.contains("requests"));
}

#[test]
fn process_tool_code_does_not_duplicate_existing_tools_import() {
    let code = "from tools import Tools, MCPToolError\nresult = Tools.get_weather(city=\"London\")";
    let result = process_tool_code(code);
    let count = result.matches("from tools import Tools").count();
    assert_eq!(count, 1);
}

#[test]
fn process_tool_code_inserts_tools_import_after_last_import() {
    let code = "import os\nimport sys\nresult = Tools.multiply(a=1, b=2)\nprint(result)";
    let result = process_tool_code(code);
    let lines: Vec<&str> = result.lines().collect();
    let idx = lines.iter().position(|l| l.contains("from tools import")).unwrap();
    assert!(lines[idx - 1].contains("import sys") || lines[idx - 1].contains("dependencies"));
}

#[test]
fn process_tool_code_is_idempotent() {
    let code = "import yaml\nresult = Tools.get_weather(city=\"Tokyo\")\nprint(result)";
    let once = process_tool_code(code);
    let twice = process_tool_code(&once);
    assert_eq!(once, twice);
}

// === proxy::generate_tools_file_content ===

#[test]
fn generate_tools_file_content_emits_one_staticmethod_per_tool() {
    let tools = sample_tools();
    let content = generate_tools_file_content(&tools, "127.0.0.1", 8088);
    assert!(content.contains("class Tools:"));
    assert!(content.contains("def get_weather(city):"));
    assert!(content.contains("def multiply(a, b):"));
    assert!(content.contains("_call_gateway(\"get_weather\", city=city)"));
    assert!(content.contains("_call_gateway(\"multiply\", a=a, b=b)"));
    assert!(content.contains("http://127.0.0.1:8088/mcp_tool_call"));
}

#[test]
fn generate_tools_file_content_handles_empty_registry() {
    let content = generate_tools_file_content(&[], "127.0.0.1", 8088);
    assert!(content.contains("class Tools:"));
    assert!(content.contains("pass"));
}

// === SandboxRunner::execute_captured ===

const FAKE_LAUNCHER_SCRIPT: &str = r#"
script="$1"
if grep -q "FAIL_MARKER" "$script" 2>/dev/null; then
    echo "something went wrong" >&2
    exit 3
fi
echo "Resolved 2 packages" >&2
echo "Installed 2 packages" >&2
grep -o 'print(.*)' "$script" | sed 's/print(//;s/)$//;s/"//g'
"#;

fn fake_runner() -> SandboxRunner {
    SandboxRunner::new("127.0.0.1", 8088).with_launcher(vec![
        "sh".to_string(),
        "-c".to_string(),
        FAKE_LAUNCHER_SCRIPT.to_string(),
        "--".to_string(),
    ])
}

#[tokio::test]
async fn execute_captured_runs_script_and_filters_installer_noise() {
    let runner = fake_runner();
    let tools = sample_tools();
    let outcome = runner.execute_captured("print(\"hello from sandbox\")", &tools).await.unwrap();
    assert!(outcome.error.is_none());
    assert!(!outcome.stderr.contains("Resolved"));
    assert!(!outcome.stderr.contains("Installed"));
}

#[tokio::test]
async fn execute_captured_surfaces_non_zero_exit_as_error() {
    let runner = fake_runner();
    let tools = sample_tools();
    let outcome = runner.execute_captured("# FAIL_MARKER\nprint(1)", &tools).await.unwrap();
    assert!(outcome.error.is_some());
    assert!(outcome.error.unwrap().contains("Script exited with code 3"));
}

#[tokio::test]
async fn registry_code_executor_maps_failure_to_err() {
    let runner = fake_runner();
    let tools = sample_tools();
    let executor = forgeclaw_sandbox::RegistryCodeExecutor::new(runner, tools);
    let result = executor.execute_python_code("# FAIL_MARKER\nprint(1)".to_string()).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Script exited with code 3"));
}

#[tokio::test]
async fn registry_code_executor_returns_stdout_on_success() {
    let runner = fake_runner();
    let tools = sample_tools();
    let executor = forgeclaw_sandbox::RegistryCodeExecutor::new(runner, tools);
    let result = executor.execute_python_code("print(\"ok\")".to_string()).await;
    assert!(result.is_ok());
}
