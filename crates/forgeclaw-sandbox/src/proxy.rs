//! Generates the `tools.py`-equivalent proxy source handed to the sandboxed
//! interpreter: one static method per registered tool, each forwarding to
//! the Tool Gateway over HTTP.

use forgeclaw_core::ToolDescriptor;

pub const TOOLS_GENERATED_FILENAME: &str = "tools.py";

fn header(host: &str, port: u16) -> String {
    format!(
        r#"import json
import sys
import requests

_GATEWAY_URL = "http://{host}:{port}/mcp_tool_call"


class MCPToolError(Exception):
    def __init__(self, message, error_type=None):
        super().__init__(message)
        self.error_type = error_type

    def __str__(self):
        return f"MCPToolError (Type: {{self.error_type or 'UNKNOWN'}}): {{super().__str__()}}"


def _call_gateway(tool_name, **kwargs):
    try:
        payload = {{"tool_name": tool_name, "arguments": kwargs}}
        response = requests.post(_GATEWAY_URL, json=payload, timeout=60)
        response.raise_for_status()
        data = response.json()

        result = data.get("result", {{}})
        if result.get("isError"):
            error_content = result.get("content", [{{}}])[0]
            error_message = error_content.get("text", "Unknown tool execution error")
            raise MCPToolError(error_message, error_type="TOOL_EXECUTION_ERROR")

        content = result.get("content", [])
        if len(content) == 1 and content[0].get("type") == "text":
            return content[0]["text"]
        return content

    except requests.HTTPError as e:
        try:
            error_data = e.response.json()
            raise MCPToolError(error_data.get("message", str(e)), error_type=error_data.get("type", "HTTP_ERROR"))
        except json.JSONDecodeError:
            raise MCPToolError(f"HTTP error {{e.response.status_code}} and failed to decode error response.", error_type="HTTP_ERROR")
    except requests.RequestException as e:
        raise MCPToolError(f"Communication error with gateway: {{e}}", error_type="AGENT_COMMUNICATION_ERROR")
    except json.JSONDecodeError:
        raise MCPToolError("Failed to decode successful JSON response from gateway.", error_type="AGENT_COMMUNICATION_ERROR")
"#
    )
}

fn indent_docstring(description: &str) -> String {
    description.trim().replace('\n', "\n        ")
}

/// Builds the full `tools.py` source for the given registry snapshot.
pub fn generate_tools_file_content(tools: &[ToolDescriptor], host: &str, port: u16) -> String {
    let mut out = header(host, port);
    out.push_str("\n\nclass Tools:\n");

    if tools.is_empty() {
        out.push_str("    pass\n");
        return out;
    }

    for tool in tools {
        let py_name = tool.sanitized_name();
        let params: Vec<&String> = tool
            .input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|obj| obj.keys().collect())
            .unwrap_or_default();
        let method_sig = params.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
        let kwargs_pass = params.iter().map(|p| format!("{p}={p}")).collect::<Vec<_>>().join(", ");
        let description = if tool.description.is_empty() { "No description provided." } else { &tool.description };

        out.push_str("    @staticmethod\n");
        out.push_str(&format!("    def {}({}):\n", py_name, method_sig));
        out.push_str(&format!("        \"\"\"{}\"\"\"\n", indent_docstring(description)));
        out.push_str(&format!("        return _call_gateway(\"{}\", {})\n\n", tool.name, kwargs_pass));
    }

    out
}

/// Builds a Python-like interface listing for the system prompt: method
/// signatures with inferred type hints, no bodies.
pub fn generate_tools_interface_for_prompt(tools: &[ToolDescriptor]) -> String {
    if tools.is_empty() {
        return "    pass  # No tools available.".to_string();
    }

    let mut lines = vec!["class Tools:".to_string()];
    for tool in tools {
        let py_name = tool.sanitized_name();
        let description = if tool.description.is_empty() { "No description provided." } else { &tool.description };
        for (i, line) in description.trim().lines().enumerate() {
            if i == 0 {
                lines.push(format!("    # Description: {}", line));
            } else {
                lines.push(format!("    # {}", line.trim()));
            }
        }

        let params: Vec<String> = tool
            .input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|obj| {
                obj.iter()
                    .map(|(name, schema)| format!("{}: {}", name, json_type_to_python_hint(schema)))
                    .collect()
            })
            .unwrap_or_default();
        let mut def_line = format!("def {}({}):", py_name, params.join(", "));
        if let Some(output_schema) = &tool.output_schema {
            if let Some(t) = output_schema.get("type").and_then(|v| v.as_str()) {
                def_line = format!("def {}({}) -> {}:", py_name, params.join(", "), json_type_hint(t));
            }
        }
        lines.push("    @staticmethod".to_string());
        lines.push(format!("    {} ...", def_line));
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

fn json_type_to_python_hint(schema: &serde_json::Value) -> String {
    schema.get("type").and_then(|v| v.as_str()).map(json_type_hint).unwrap_or_else(|| "any".to_string())
}

fn json_type_hint(json_type: &str) -> String {
    match json_type {
        "string" => "str",
        "number" => "float",
        "integer" => "int",
        "boolean" => "bool",
        "object" => "dict",
        "array" => "list",
        _ => "any",
    }
    .to_string()
}
