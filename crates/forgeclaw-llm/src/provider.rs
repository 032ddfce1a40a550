use crate::types::StreamDelta;
use forgeclaw_core::Message;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid response from transport: {0}")]
    InvalidResponse(String),

    #[error("generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;
pub type LlmStream = Pin<Box<dyn Stream<Item = LlmResult<StreamDelta>> + Send>>;

/// The LLM transport client. Deliberately out of scope for the core's hard
/// engineering — specified only at this interface. `complete` and
/// `complete_stream` both take the full history verbatim; the Kernel is the
/// only caller and owns all conversation-shaping.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Non-streaming completion: returns the full response text.
    async fn complete(&self, history: &[Message], model: &str, temperature: f32) -> LlmResult<String>;

    /// Streaming completion. `cancel`, when triggered, ends the stream early
    /// without an error — the caller treats this as an interrupted turn.
    async fn complete_stream(
        &self,
        history: &[Message],
        model: &str,
        temperature: f32,
        cancel: Option<CancellationToken>,
    ) -> LlmResult<LlmStream>;
}
