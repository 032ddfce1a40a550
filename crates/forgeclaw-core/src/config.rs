use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the `mcpServers` map in a tool-server config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct McpServerConfig {
    /// A shell-style command line, tokenized with shell quoting rules.
    #[serde(default)]
    pub run: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl McpServerConfig {
    /// Resolves this entry into a `(program, args, env)` triple. `run` is
    /// tokenized with shell-word splitting; `command`/`args` are used verbatim.
    pub fn resolve(&self) -> Option<(String, Vec<String>, HashMap<String, String>)> {
        if let Some(run) = &self.run {
            let words = shell_words::split(run).ok()?;
            let (program, args) = words.split_first()?;
            return Some((program.clone(), args.to_vec(), self.env.clone()));
        }
        let command = self.command.clone()?;
        Some((command, self.args.clone(), self.env.clone()))
    }
}

/// Top-level tool-server configuration document (§6 "Configuration file").
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolServerConfig {
    #[serde(default, rename = "mcpServers")]
    pub mcp_servers: HashMap<String, McpServerConfig>,
    #[serde(default)]
    pub tool_patches: HashMap<String, serde_json::Value>,
}

impl ToolServerConfig {
    pub fn from_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_str(&text)?)
    }
}

/// Network bind address for the Tool Gateway. Defaults to loopback-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8989 }
    }
}

impl GatewayConfig {
    pub fn to_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Orchestrator-level configuration, layered compiled-in-default < config-file < CLI flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub model: String,
    pub llm_base_url: String,
    pub tool_server_config_path: Option<std::path::PathBuf>,
    pub auto_accept_code: bool,
    pub temperature: f32,
    pub gateway: GatewayConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            llm_base_url: "http://localhost:11434".to_string(),
            tool_server_config_path: None,
            auto_accept_code: false,
            temperature: 0.7,
            gateway: GatewayConfig::default(),
        }
    }
}
