//! Agent Kernel: the cooperative turn-based scheduler. Grounded on
//! `original_source/internal/kernel.py`'s `Kernel.run_turn` /
//! `_execute_tool_calls` / `_resolve_argument_references`.

use crate::confirm::{ActionConfirmer, ActionKind, AutoAcceptConfirmer};
use crate::store::AgentStore;
use crate::stream::{NullStreamSink, StreamSink};
use forgeclaw_core::{AgentId, AgentStatus, Message, Role, ToolCall, ToolCallResult, ToolResultEnvelope};
use forgeclaw_core::{TOOL_TAG_END, TOOL_TAG_START};
use forgeclaw_llm::{LlmProvider, StreamDelta};
use forgeclaw_mcp::McpManager;
use forgeclaw_tools::ToolRegistry;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn tool_tag_regex() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!("(?s){}(.*?){}", regex::escape(TOOL_TAG_START), regex::escape(TOOL_TAG_END));
        regex::Regex::new(&pattern).unwrap()
    })
}

pub struct Kernel {
    pub store: Arc<AgentStore>,
    registry: Arc<ToolRegistry>,
    mcp_manager: Arc<McpManager>,
    llm: Arc<dyn LlmProvider>,
    confirmer: Arc<dyn ActionConfirmer>,
    stream_sink: Arc<dyn StreamSink>,
    system_prompt_generator: Arc<dyn Fn() -> String + Send + Sync>,
    model: String,
    temperature: f32,
    streaming: bool,
    call_id_counters: dashmap::DashMap<AgentId, AtomicU64>,
}

pub struct KernelBuilder {
    store: Arc<AgentStore>,
    registry: Arc<ToolRegistry>,
    mcp_manager: Arc<McpManager>,
    llm: Arc<dyn LlmProvider>,
    confirmer: Arc<dyn ActionConfirmer>,
    stream_sink: Arc<dyn StreamSink>,
    system_prompt_generator: Arc<dyn Fn() -> String + Send + Sync>,
    model: String,
    temperature: f32,
    streaming: bool,
}

impl KernelBuilder {
    pub fn new(
        store: Arc<AgentStore>,
        registry: Arc<ToolRegistry>,
        mcp_manager: Arc<McpManager>,
        llm: Arc<dyn LlmProvider>,
        system_prompt_generator: Arc<dyn Fn() -> String + Send + Sync>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            store,
            registry,
            mcp_manager,
            llm,
            confirmer: Arc::new(AutoAcceptConfirmer),
            stream_sink: Arc::new(NullStreamSink),
            system_prompt_generator,
            model: model.into(),
            temperature,
            streaming: false,
        }
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn ActionConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_stream_sink(mut self, sink: Arc<dyn StreamSink>) -> Self {
        self.stream_sink = sink;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn build(self) -> Kernel {
        Kernel {
            store: self.store,
            registry: self.registry,
            mcp_manager: self.mcp_manager,
            llm: self.llm,
            confirmer: self.confirmer,
            stream_sink: self.stream_sink,
            system_prompt_generator: self.system_prompt_generator,
            model: self.model,
            temperature: self.temperature,
            streaming: self.streaming,
            call_id_counters: dashmap::DashMap::new(),
        }
    }
}

impl Kernel {
    fn next_call_id(&self, agent_id: &AgentId) -> String {
        let counter = self.call_id_counters.entry(agent_id.clone()).or_insert_with(|| AtomicU64::new(0));
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("call_{}", n)
    }

    /// Advances exactly one LLM turn for `agent_id`. Preconditions: the
    /// stored agent's status is `READY`.
    pub async fn run_turn(&self, agent_id: &AgentId, cancel: Option<CancellationToken>) {
        self.store.with_mut(agent_id, |a| a.status = AgentStatus::Running);

        let refreshed_system = (self.system_prompt_generator)();
        self.store.with_mut(agent_id, |a| {
            if let Some(first) = a.history.first_mut() {
                if first.role == Role::System {
                    first.content = refreshed_system;
                }
            }
        });

        let Some(agent) = self.store.get(agent_id) else {
            tracing::error!(agent_id = %agent_id, "run_turn called for unknown agent");
            return;
        };

        let (response_text, interrupted) = self.call_llm(&agent, cancel).await;
        if interrupted {
            self.store.with_mut(agent_id, |a| a.status = AgentStatus::Done);
            return;
        }

        let tool_content = tool_tag_regex()
            .captures(&response_text)
            .map(|c| c[1].trim().to_string());

        let Some(tool_content) = tool_content else {
            self.store.with_mut(agent_id, |a| {
                a.history.push(Message::assistant(response_text));
                a.status = AgentStatus::Done;
            });
            return;
        };

        let full_assistant_message = format!("{}\n{}\n{}", TOOL_TAG_START, tool_content, TOOL_TAG_END);
        self.store.with_mut(agent_id, |a| a.history.push(Message::assistant(full_assistant_message)));

        let tool_calls: Vec<ToolCall> = match serde_json::from_str::<Vec<ToolCall>>(&tool_content) {
            Ok(calls) => calls,
            Err(e) => {
                self.fail_batch_parse(agent_id, &e.to_string());
                return;
            }
        };

        let (results, waiting) = self.execute_tool_calls(agent_id, &agent, tool_calls).await;

        let feedback = format!(
            "TOOL_EXECUTION_RESULT:\n```json\n{}\n```",
            serde_json::to_string_pretty(&results).unwrap_or_default()
        );
        self.store.with_mut(agent_id, |a| {
            a.history.push(Message::user(feedback));
            a.status = if waiting { AgentStatus::Waiting } else { AgentStatus::Ready };
        });
    }

    fn fail_batch_parse(&self, agent_id: &AgentId, parser_error: &str) {
        let error_message =
            format!("Error: Invalid tool format. Expected a JSON list within <tool> tags. Parser error: {}", parser_error);
        tracing::error!(agent_id = %agent_id, "{}", error_message);
        self.store.with_mut(agent_id, |a| {
            a.history.push(Message::user(format!("TOOL_EXECUTION_RESULT:\n{}", error_message)));
            a.status = AgentStatus::Ready;
        });
    }

    async fn call_llm(
        &self,
        agent: &forgeclaw_core::Agent,
        cancel: Option<CancellationToken>,
    ) -> (String, bool) {
        if self.streaming && agent.is_main {
            return self.call_llm_stream(&agent.history, cancel).await;
        }
        match self.llm.complete(&agent.history, &self.model, self.temperature).await {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::error!("LLM call failed: {}", e);
                (format!("Error: Could not contact LLM. {}", e), false)
            }
        }
    }

    async fn call_llm_stream(
        &self,
        history: &[Message],
        cancel: Option<CancellationToken>,
    ) -> (String, bool) {
        let stream = match self.llm.complete_stream(history, &self.model, self.temperature, cancel.clone()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("LLM streaming call failed: {}", e);
                return (format!("Error: Could not contact LLM. {}", e), false);
            }
        };

        let mut stream = stream;
        let mut full = String::new();
        loop {
            if let Some(token) = &cancel {
                if token.is_cancelled() {
                    return (full, true);
                }
            }
            match stream.next().await {
                Some(Ok(StreamDelta::Text(chunk))) => {
                    self.stream_sink.on_chunk(&chunk).await;
                    full.push_str(&chunk);
                }
                Some(Ok(StreamDelta::Done)) => break,
                Some(Err(e)) => {
                    tracing::error!("LLM stream error: {}", e);
                    break;
                }
                None => break,
            }
        }
        (full, false)
    }

    async fn execute_tool_calls(
        &self,
        agent_id: &AgentId,
        agent: &forgeclaw_core::Agent,
        tool_calls: Vec<ToolCall>,
    ) -> (Vec<ToolCallResult>, bool) {
        let mut results = Vec::new();
        let mut by_id: HashMap<String, ToolResultEnvelope> = HashMap::new();
        let mut waiting = false;

        for call in tool_calls {
            let call_id = call.call_id.clone().unwrap_or_else(|| self.next_call_id(agent_id));

            let resolved_args = match resolve_refs(&call.arguments, &by_id) {
                Ok(v) => v,
                Err(e) => {
                    let envelope = ToolResultEnvelope::error(e);
                    by_id.insert(call_id.clone(), envelope.clone());
                    results.push(ToolCallResult { call_id, result: envelope });
                    continue;
                }
            };

            if call.tool_name == "wait_for_agents" {
                waiting = true;
                let envelope = ToolResultEnvelope::success(Value::String(
                    "Agent is now waiting for sub-agents to complete.".to_string(),
                ));
                by_id.insert(call_id.clone(), envelope.clone());
                results.push(ToolCallResult { call_id, result: envelope });
                tracing::info!(agent_id = %agent_id, "wait directive received, stopping batch");
                break;
            }

            let kind = if call.tool_name == "execute_python_code" { ActionKind::CodeExecution } else { ActionKind::ToolCall };
            let details = if call.tool_name == "execute_python_code" {
                resolved_args.get("code").and_then(|v| v.as_str()).unwrap_or_default().to_string()
            } else {
                serde_json::to_string_pretty(&call).unwrap_or_default()
            };

            if !self.confirmer.confirm(agent_id.as_str(), &agent.role, kind, &details).await {
                let envelope = ToolResultEnvelope::error("Tool execution was declined by the user.");
                by_id.insert(call_id.clone(), envelope.clone());
                results.push(ToolCallResult { call_id, result: envelope });
                continue;
            }

            let envelope = self.dispatch_tool(&call.tool_name, resolved_args).await;
            by_id.insert(call_id.clone(), envelope.clone());
            results.push(ToolCallResult { call_id, result: envelope });
        }

        (results, waiting)
    }

    async fn dispatch_tool(&self, tool_name: &str, args: Value) -> ToolResultEnvelope {
        if self.registry.get(tool_name).is_some() {
            tracing::info!(tool = %tool_name, "executing tool");
            return self.registry.execute(tool_name, args).await.to_envelope();
        }

        if self.mcp_manager.has_tool(tool_name).await {
            tracing::info!(tool = %tool_name, "dispatching to MCP server");
            let raw = self.mcp_manager.dispatch_tool_call(tool_name, args).await;
            return unwrap_mcp_envelope(raw);
        }

        ToolResultEnvelope::error(format!("Tool '{}' not found.", tool_name))
    }
}

/// The raw JSON-RPC `tools/call` result — `{content:[{type,text}], isError}` —
/// arrives as the `output` of a successful envelope from `McpManager`. Unwrap
/// it the way `kernel.py`'s `_execute_tool_calls` does: single-text-content
/// becomes a plain string output, `isError: true` becomes an error envelope.
fn unwrap_mcp_envelope(raw: ToolResultEnvelope) -> ToolResultEnvelope {
    let ToolResultEnvelope::Success { output: Some(value) } = raw else {
        return raw;
    };

    let is_error = value.get("isError").and_then(|v| v.as_bool()).unwrap_or(false);
    let content = value.get("content").and_then(|v| v.as_array()).cloned().unwrap_or_default();

    if is_error {
        let message = content
            .first()
            .and_then(|c| c.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown MCP tool error")
            .to_string();
        return ToolResultEnvelope::error(message);
    }

    if content.len() == 1 && content[0].get("type").and_then(|v| v.as_str()) == Some("text") {
        let text = content[0].get("text").and_then(|v| v.as_str()).unwrap_or_default();
        return ToolResultEnvelope::success(Value::String(text.to_string()));
    }

    ToolResultEnvelope::success(Value::Array(content))
}

/// Recursively replaces `$<call_id>` string values with the `output` of a
/// previously executed call in this batch. Unlike the distilled reference
/// implementation, this recurses into list items that are themselves plain
/// strings, not only into dict-shaped list items — the specification's
/// "objects and lists" wording is broader than the original's dict-only walk.
fn resolve_refs(value: &Value, results: &HashMap<String, ToolResultEnvelope>) -> Result<Value, String> {
    match value {
        Value::String(s) if s.starts_with('$') && s.len() > 1 => {
            let ref_id = &s[1..];
            match results.get(ref_id) {
                Some(envelope) => Ok(envelope.output().cloned().unwrap_or(Value::Null)),
                None => Err(format!("Invalid reference: Tool result for '{}' not found.", ref_id)),
            }
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), resolve_refs(v, results)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                out.push(resolve_refs(item, results)?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other.clone()),
    }
}
