//! LLM transport collaborator — specified only at its interface (§1, §9).

pub mod ollama;
pub mod provider;
pub mod testing;
pub mod types;

pub use ollama::OllamaProvider;
pub use provider::{LlmError, LlmProvider, LlmResult, LlmStream};
pub use testing::StubProvider;
pub use types::{ChatMessage, StreamDelta};
