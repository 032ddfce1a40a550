//! Materializes a fresh temp directory per invocation, writes the generated
//! proxy source plus the pre-processed user code into it, and runs the
//! result under an external interpreter launcher.

use crate::deps::process_tool_code;
use crate::error::{SandboxError, SandboxResult};
use crate::proxy::{generate_tools_file_content, TOOLS_GENERATED_FILENAME};
use forgeclaw_core::ToolDescriptor;
use forgeclaw_tools::CodeExecutor;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

const DEFAULT_CAPTURED_TIMEOUT: Duration = Duration::from_secs(120);
const MAIN_FILENAME: &str = "main.py";

/// Result of a single sandbox invocation.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
}

/// Launches user-supplied code in a fresh temp directory, with a generated
/// tool proxy wired to the Tool Gateway. The interpreter launcher defaults
/// to `uv run`, matching the reference implementation; both are
/// configurable so an alternate launcher can be substituted without
/// touching the dependency-preprocessing or proxy-generation logic.
pub struct SandboxRunner {
    launcher: Vec<String>,
    gateway_host: String,
    gateway_port: u16,
    captured_timeout: Duration,
}

impl SandboxRunner {
    pub fn new(gateway_host: impl Into<String>, gateway_port: u16) -> Self {
        Self {
            launcher: vec!["uv".to_string(), "run".to_string()],
            gateway_host: gateway_host.into(),
            gateway_port,
            captured_timeout: DEFAULT_CAPTURED_TIMEOUT,
        }
    }

    pub fn with_launcher(mut self, launcher: Vec<String>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_captured_timeout(mut self, timeout: Duration) -> Self {
        self.captured_timeout = timeout;
        self
    }

    fn materialize(&self, code: &str, tools: &[ToolDescriptor]) -> SandboxResult<tempfile::TempDir> {
        let dir = tempfile::Builder::new().prefix("forgeclaw_sandbox_").tempdir().map_err(SandboxError::TempDir)?;

        let tools_source = generate_tools_file_content(tools, &self.gateway_host, self.gateway_port);
        let tools_path = dir.path().join(TOOLS_GENERATED_FILENAME);
        std::fs::write(&tools_path, tools_source)
            .map_err(|e| SandboxError::WriteFile { path: tools_path.display().to_string(), source: e })?;

        let processed = process_tool_code(code);
        let main_path = dir.path().join(MAIN_FILENAME);
        std::fs::write(&main_path, processed)
            .map_err(|e| SandboxError::WriteFile { path: main_path.display().to_string(), source: e })?;

        Ok(dir)
    }

    /// Captured mode: stdout/stderr piped, a wall-clock timeout applies.
    /// Installer-noise lines are filtered out of stderr.
    pub async fn execute_captured(&self, code: &str, tools: &[ToolDescriptor]) -> SandboxResult<ExecutionOutcome> {
        let dir = self.materialize(code, tools)?;

        let (program, rest) = self.launcher.split_first().expect("launcher must be non-empty");
        let mut command = Command::new(program);
        command.args(rest).arg(MAIN_FILENAME).current_dir(dir.path()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child =
            command.spawn().map_err(|e| SandboxError::Launch { launcher: program.clone(), source: e })?;

        let mut stdout_pipe = child.stdout.take().expect("stdout piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr piped");

        let wait = async {
            let mut stdout_buf = Vec::new();
            let mut stderr_buf = Vec::new();
            let (_, _, status) = tokio::join!(
                stdout_pipe.read_to_end(&mut stdout_buf),
                stderr_pipe.read_to_end(&mut stderr_buf),
                child.wait(),
            );
            (stdout_buf, stderr_buf, status)
        };

        let (stdout_buf, stderr_buf, status) = match tokio::time::timeout(self.captured_timeout, wait).await {
            Ok(result) => result,
            Err(_) => {
                let _ = child.start_kill();
                return Err(SandboxError::Timeout(self.captured_timeout));
            }
        };

        let status = status.map_err(|e| SandboxError::Launch { launcher: program.clone(), source: e })?;
        let stdout = String::from_utf8_lossy(&stdout_buf).trim().to_string();
        let stderr = filter_installer_noise(&String::from_utf8_lossy(&stderr_buf));
        let error = match status.code() {
            Some(0) => None,
            Some(n) => Some(format!("Script exited with code {}.", n)),
            None => Some("Script terminated by signal.".to_string()),
        };

        tracing::info!(exit_code = ?status.code(), "sandbox execution finished");
        Ok(ExecutionOutcome { stdout, stderr, error })
    }

    /// Interactive mode: stdin/stdout/stderr are shared with the parent
    /// process, no timeout is applied. Used for a human running code
    /// directly against a live terminal rather than as an agent's tool call.
    pub async fn execute_interactive(&self, code: &str, tools: &[ToolDescriptor]) -> SandboxResult<ExecutionOutcome> {
        let dir = self.materialize(code, tools)?;

        let (program, rest) = self.launcher.split_first().expect("launcher must be non-empty");
        let status = Command::new(program)
            .args(rest)
            .arg(MAIN_FILENAME)
            .current_dir(dir.path())
            .status()
            .await
            .map_err(|e| SandboxError::Launch { launcher: program.clone(), source: e })?;

        let code = status.code().unwrap_or(-1);
        Ok(ExecutionOutcome {
            stdout: "Interactive session completed.".to_string(),
            stderr: format!("Process exited with return code {}.", code),
            error: if code != 0 { Some(format!("Script exited with code {}.", code)) } else { None },
        })
    }
}

fn filter_installer_noise(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.is_empty()
                || trimmed.starts_with("Installed ")
                || trimmed.starts_with("Resolved ")
                || trimmed.starts_with("Downloaded ")
                || trimmed.starts_with("Audited "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Bridges `SandboxRunner` to the `CodeExecutor` handle `forgeclaw-tools`'
/// `execute_python_code` tool dispatches through. Always runs in captured
/// mode — interactive mode is reserved for a human directly driving the
/// sandbox, not for an agent's tool call.
pub struct RegistryCodeExecutor {
    runner: SandboxRunner,
    tools_snapshot: Vec<ToolDescriptor>,
}

impl RegistryCodeExecutor {
    pub fn new(runner: SandboxRunner, tools_snapshot: Vec<ToolDescriptor>) -> Self {
        Self { runner, tools_snapshot }
    }
}

#[async_trait::async_trait]
impl CodeExecutor for RegistryCodeExecutor {
    async fn execute_python_code(&self, code: String) -> Result<String, String> {
        let outcome = self.runner.execute_captured(&code, &self.tools_snapshot).await.map_err(|e| e.to_string())?;
        match outcome.error {
            Some(err) => {
                let mut message = err;
                if !outcome.stderr.is_empty() {
                    message.push('\n');
                    message.push_str(&outcome.stderr);
                }
                Err(message)
            }
            None => Ok(outcome.stdout),
        }
    }
}
