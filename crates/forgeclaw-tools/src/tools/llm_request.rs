//! `llm_request` — a one-off, side-conversation LLM call (§1.2 supplemented
//! feature, ported from `agent_tools.py`). Does not touch the caller's
//! history or status.

use crate::registry::{Tool, ToolResult};
use forgeclaw_core::Message;
use forgeclaw_llm::LlmProvider;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct LlmRequestTool {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl LlmRequestTool {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, temperature: f32) -> Self {
        Self { provider, model: model.into(), temperature }
    }
}

#[async_trait::async_trait]
impl Tool for LlmRequestTool {
    fn name(&self) -> &str {
        "llm_request"
    }

    fn description(&self) -> &str {
        "Make a one-off LLM call outside the current conversation and get the raw \
         completion text back. Use for sub-queries that should not pollute history."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {"type": "string", "description": "The user message to send"}
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let prompt = match args.get("prompt").and_then(|v| v.as_str()) {
            Some(p) => p,
            None => return ToolResult::error("Missing required parameter: prompt"),
        };
        let history = vec![
            Message::system("You are a helpful assistant answering a single, isolated question."),
            Message::user(prompt),
        ];
        match self.provider.complete(&history, &self.model, self.temperature).await {
            Ok(text) => ToolResult::text(text),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
