use thiserror::Error;

/// Error returned by `ToolServerConfig::from_file`, the only place in this
/// workspace that produces one. Every other crate (forgeclaw-llm, forgeclaw-
/// sandbox, forgeclaw-mcp, ...) defines and propagates its own error type
/// instead of converting into this one.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
