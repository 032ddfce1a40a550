//! Streaming-chunk sink — the other half of the terminal-rendering
//! collaborator interface. The Kernel accumulates the full response text
//! regardless; this only exists so a caller can render chunks as they arrive.

#[async_trait::async_trait]
pub trait StreamSink: Send + Sync {
    async fn on_chunk(&self, text: &str);
}

pub struct NullStreamSink;

#[async_trait::async_trait]
impl StreamSink for NullStreamSink {
    async fn on_chunk(&self, _text: &str) {}
}
