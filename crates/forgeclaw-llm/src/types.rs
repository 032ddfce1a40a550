use forgeclaw_core::{Message, Role};
use serde::{Deserialize, Serialize};

/// Ollama-wire message — a plain `{role, content}` pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(m: &Message) -> Self {
        let role = match m.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self { role: role.to_string(), content: m.content.clone() }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: ChatOptions,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
    #[serde(default)]
    pub done: bool,
}

/// A streamed increment of the assistant's response text.
#[derive(Clone, Debug)]
pub enum StreamDelta {
    Text(String),
    Done,
}
