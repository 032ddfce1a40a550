//! Ollama-compatible transport: `POST {base_url}/api/chat`, NDJSON streaming.

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::{ChatChunk, ChatMessage, ChatOptions, ChatRequest, StreamDelta};
use forgeclaw_core::Message;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), client: reqwest::Client::new() }
    }

    fn request(&self, history: &[Message], model: &str, temperature: f32, stream: bool) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: history.iter().map(ChatMessage::from).collect(),
            stream,
            options: ChatOptions { temperature },
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, history: &[Message], model: &str, temperature: f32) -> LlmResult<String> {
        let req = self.request(history, model, temperature, false);
        let url = format!("{}/api/chat", self.base_url);
        let resp = self.client.post(&url).json(&req).send().await?;
        let resp = resp.error_for_status().map_err(|e| LlmError::RequestFailed(e.to_string()))?;
        let chunk: ChatChunk = resp.json().await.map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(chunk.message.map(|m| m.content).unwrap_or_default())
    }

    async fn complete_stream(
        &self,
        history: &[Message],
        model: &str,
        temperature: f32,
        cancel: Option<CancellationToken>,
    ) -> LlmResult<LlmStream> {
        let req = self.request(history, model, temperature, true);
        let url = format!("{}/api/chat", self.base_url);
        let resp = self.client.post(&url).json(&req).send().await?;
        let resp = resp.error_for_status().map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let stream = async_stream::stream! {
            let mut bytes_stream = resp.bytes_stream();
            let mut buf = String::new();
            loop {
                if let Some(token) = &cancel {
                    if token.is_cancelled() {
                        yield Err(LlmError::Cancelled);
                        return;
                    }
                }
                match bytes_stream.next().await {
                    Some(Ok(bytes)) => {
                        buf.push_str(&String::from_utf8_lossy(&bytes));
                        while let Some(pos) = buf.find('\n') {
                            let line = buf[..pos].trim().to_string();
                            buf.drain(..=pos);
                            if line.is_empty() {
                                continue;
                            }
                            match serde_json::from_str::<ChatChunk>(&line) {
                                Ok(chunk) => {
                                    if let Some(m) = chunk.message {
                                        if !m.content.is_empty() {
                                            yield Ok(StreamDelta::Text(m.content));
                                        }
                                    }
                                    if chunk.done {
                                        yield Ok(StreamDelta::Done);
                                        return;
                                    }
                                }
                                Err(e) => {
                                    yield Err(LlmError::InvalidResponse(e.to_string()));
                                    return;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        yield Err(LlmError::Network(e));
                        return;
                    }
                    None => {
                        yield Ok(StreamDelta::Done);
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
