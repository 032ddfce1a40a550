//! Reference in-process tools used by the testable scenarios (§8): a stub
//! weather lookup and a pure arithmetic tool. Ported from `internal_tools.py`.

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};

pub struct WeatherTool;

#[async_trait::async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city. Only London and Tokyo are supported."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, e.g. 'London' or 'Tokyo'"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let city = match args.get("city").and_then(|v| v.as_str()) {
            Some(c) => c,
            None => return ToolResult::error("'city' must be a string"),
        };
        match city {
            "London" => ToolResult::text("It is 15°C and cloudy in London."),
            "Tokyo" => ToolResult::text("It is 22°C and clear in Tokyo."),
            other => ToolResult::error(format!("No weather data available for '{}'", other)),
        }
    }
}

pub struct MultiplyTool;

#[async_trait::async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply_numbers"
    }

    fn description(&self) -> &str {
        "Multiplies two numbers and returns the product."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"}
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let a = match args.get("a").and_then(|v| v.as_f64()) {
            Some(n) => n,
            None => return ToolResult::error("'a' must be a number"),
        };
        let b = match args.get("b").and_then(|v| v.as_f64()) {
            Some(n) => n,
            None => return ToolResult::error("'b' must be a number"),
        };
        let product = a * b;
        if product.fract() == 0.0 {
            ToolResult::Json(json!(product as i64))
        } else {
            ToolResult::Json(json!(product))
        }
    }
}
