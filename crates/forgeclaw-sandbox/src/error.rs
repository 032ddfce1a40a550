#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to create sandbox temp directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write sandbox file {path}: {source}")]
    WriteFile { path: String, #[source] source: std::io::Error },
    #[error("failed to launch interpreter '{launcher}': {source}")]
    Launch { launcher: String, #[source] source: std::io::Error },
    #[error("sandbox execution timed out after {0:?}")]
    Timeout(std::time::Duration),
}

pub type SandboxResult<T> = Result<T, SandboxError>;
