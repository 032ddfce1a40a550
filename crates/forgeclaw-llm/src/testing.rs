//! A scripted provider for exercising the Kernel without a real LLM backend.

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::StreamDelta;
use forgeclaw_core::Message;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Returns one scripted response per call, in order. Panics if exhausted.
/// Records the history passed to the most recent `complete`/`complete_stream`
/// call so tests can assert on what was actually sent, not just what came back.
pub struct StubProvider {
    responses: Mutex<std::collections::VecDeque<String>>,
    last_history: Mutex<Option<Vec<Message>>>,
}

impl StubProvider {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            last_history: Mutex::new(None),
        }
    }

    fn next_response(&self) -> String {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("StubProvider: scripted responses exhausted")
    }

    /// The `history` argument passed to the most recent call, if any.
    pub fn last_history(&self) -> Option<Vec<Message>> {
        self.last_history.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, history: &[Message], _model: &str, _temperature: f32) -> LlmResult<String> {
        *self.last_history.lock().unwrap() = Some(history.to_vec());
        Ok(self.next_response())
    }

    async fn complete_stream(
        &self,
        history: &[Message],
        model: &str,
        temperature: f32,
        _cancel: Option<CancellationToken>,
    ) -> LlmResult<LlmStream> {
        let text = self.complete(history, model, temperature).await?;
        let stream = async_stream::stream! {
            yield Ok::<_, LlmError>(StreamDelta::Text(text));
            yield Ok(StreamDelta::Done);
        };
        Ok(Box::pin(stream))
    }
}
