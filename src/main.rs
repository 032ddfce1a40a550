//! Main Orchestrator: builds the registry, starts the Tool Gateway, seeds the
//! root agent, and runs the outer REPL loop described in the System Overview.

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use forgeclaw_agent::{AgentStore, Kernel, KernelBuilder, KernelSpawner};
use forgeclaw_core::{AgentStatus, GatewayConfig, Message, OrchestratorConfig, ToolServerConfig};
use forgeclaw_gateway::{build_router, GatewayState};
use forgeclaw_llm::{LlmProvider, OllamaProvider};
use forgeclaw_mcp::McpManager;
use forgeclaw_sandbox::{RegistryCodeExecutor, SandboxRunner};
use forgeclaw_tools::{create_default_registry, create_executor_handle, create_spawn_handle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const OWN_TARGETS: &[&str] = &[
    "forgeclaw",
    "forgeclaw_core",
    "forgeclaw_llm",
    "forgeclaw_tools",
    "forgeclaw_mcp",
    "forgeclaw_gateway",
    "forgeclaw_sandbox",
    "forgeclaw_agent",
];

#[derive(Parser)]
#[command(name = "forgeclaw", about = "Local code-executing AI agent runtime")]
struct Cli {
    /// LLM model identifier (required)
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL of the LLM transport (Ollama-compatible `/api/chat`)
    #[arg(long, default_value = "http://localhost:11434")]
    llm_base_url: String,

    /// Path to a tool-server config file (mcpServers / tool_patches)
    #[arg(long)]
    tool_server_config: Option<std::path::PathBuf>,

    /// Skip the confirmation prompt before running sandboxed code or tools
    #[arg(long, default_value_t = false)]
    auto_accept_code: bool,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Tool Gateway bind host
    #[arg(long, default_value = "127.0.0.1")]
    gateway_host: String,

    /// Tool Gateway bind port
    #[arg(long, default_value_t = 8989)]
    gateway_port: u16,

    /// Raise this crate's log target to debug
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Raise this crate's and dependency log targets to debug
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn init_tracing(verbose: bool, debug: bool) {
    let own_level = if verbose || debug { "debug" } else { "info" };
    let default_level = if debug { "debug" } else { "warn" };
    let mut directives: Vec<String> = OWN_TARGETS.iter().map(|t| format!("{}={}", t, own_level)).collect();
    directives.insert(0, default_level.to_string());
    let filter = directives.join(",");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Renders the tool list the root agent sees every turn, plus the
/// `<tool>...</tool>` calling convention. Snapshotted once at startup: the
/// system-prompt generator handed to the Kernel/Spawner has no async access
/// to re-query the MCP manager for tools added by a later reload.
fn build_system_prompt(descriptors: &[forgeclaw_core::ToolDescriptor], extra_prompts: &str) -> String {
    let mut out = String::from(
        "You are a local agent that can call tools to accomplish tasks.\n\n\
         To call one or more tools, respond with exactly one block of the form:\n\
         <tool>\n[{\"call_id\": \"c1\", \"tool_name\": \"...\", \"arguments\": {...}}]\n</tool>\n\n\
         A later call's arguments may reference an earlier call's output with \"$<call_id>\". \
         Otherwise, just answer in plain text.\n\nAvailable tools:\n",
    );
    for d in descriptors {
        out.push_str(&format!("- {}: {}\n", d.name, d.description));
    }
    if !extra_prompts.is_empty() {
        out.push('\n');
        out.push_str(extra_prompts);
    }
    out
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    let Some(model) = cli.model else {
        eprintln!("Error: --model is required");
        std::process::exit(1);
    };

    let config = OrchestratorConfig {
        model: model.clone(),
        llm_base_url: cli.llm_base_url.clone(),
        tool_server_config_path: cli.tool_server_config.clone(),
        auto_accept_code: cli.auto_accept_code,
        temperature: cli.temperature,
        gateway: GatewayConfig { host: cli.gateway_host, port: cli.gateway_port },
    };

    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(config.llm_base_url.clone()));
    let spawn_handle = create_spawn_handle();
    let executor_handle = create_executor_handle();
    let workspace_root = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));

    let registry = Arc::new(create_default_registry(
        &workspace_root,
        llm.clone(),
        config.model.clone(),
        config.temperature,
        spawn_handle.clone(),
        executor_handle.clone(),
    ));

    let tool_server_config = match &config.tool_server_config_path {
        Some(path) => match ToolServerConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("failed to load tool-server config from {}: {}", path.display(), e);
                ToolServerConfig::default()
            }
        },
        None => ToolServerConfig::default(),
    };
    let mcp_manager = Arc::new(McpManager::new(tool_server_config));
    mcp_manager.startup().await;

    let mut descriptors = registry.get_definitions();
    descriptors.extend(mcp_manager.get_all_tools_metadata().await);

    let gateway_state = Arc::new(GatewayState { mcp_manager: mcp_manager.clone(), registry: registry.clone() });
    let addr: std::net::SocketAddr = match config.gateway.to_addr().parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: invalid gateway bind address: {}", e);
            std::process::exit(1);
        }
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: gateway failed to start on {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "tool gateway listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, build_router(gateway_state)).await {
            tracing::error!("tool gateway exited: {}", e);
        }
    });

    let prompt_text = Arc::new(build_system_prompt(&descriptors, &registry.combined_prompts()));
    let system_prompt_generator: Arc<dyn Fn() -> String + Send + Sync> = {
        let prompt_text = prompt_text.clone();
        Arc::new(move || (*prompt_text).clone())
    };

    let store = Arc::new(AgentStore::new("assistant", (*prompt_text).clone()));

    let spawner = Arc::new(KernelSpawner::new(store.clone(), system_prompt_generator.clone()));
    *spawn_handle.write().await = Some(spawner as Arc<dyn forgeclaw_tools::AgentSpawner>);

    let sandbox_runner = SandboxRunner::new(config.gateway.host.clone(), config.gateway.port);
    let code_executor = Arc::new(RegistryCodeExecutor::new(sandbox_runner, descriptors.clone()));
    *executor_handle.write().await = Some(code_executor as Arc<dyn forgeclaw_tools::CodeExecutor>);

    // `auto_accept_code` is honored by always auto-accepting: the interactive
    // confirmation prompt itself lives in the terminal rendering layer, an
    // explicit non-goal, so there is no UI-backed `ActionConfirmer` to fall
    // back to when the flag is left off.
    let confirmer: Arc<dyn forgeclaw_agent::ActionConfirmer> = Arc::new(forgeclaw_agent::AutoAcceptConfirmer);

    let kernel: Kernel = KernelBuilder::new(
        store.clone(),
        registry.clone(),
        mcp_manager.clone(),
        llm.clone(),
        system_prompt_generator.clone(),
        config.model.clone(),
        config.temperature,
    )
    .with_confirmer(confirmer)
    .build();

    run_repl(store, kernel).await;

    mcp_manager.shutdown().await;
}

/// Reads one line of user input at a time, drives the cooperative scheduler
/// to quiescence, then prints the root agent's final answer. Per the Agent
/// Store's documented policy, a `WAITING` root with no `READY` agent left
/// anywhere is flipped back to `READY` here once all of its children are
/// `DONE`, letting it synthesize a summary from their results.
async fn run_repl(store: Arc<AgentStore>, kernel: Kernel) {
    let root_id = store.root_id().clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("> ");
    let _ = std::io::stdout().flush();

    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            print!("> ");
            let _ = std::io::stdout().flush();
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        store.with_mut(&root_id, |a| {
            a.history.push(Message::user(trimmed.to_string()));
            a.status = AgentStatus::Ready;
        });

        loop {
            while let Some(agent_id) = store.next_ready() {
                kernel.run_turn(&agent_id, None).await;
            }
            let root = store.get(&root_id).expect("root agent always exists");
            if root.status == AgentStatus::Waiting && store.all_children_done(&root_id) {
                store.with_mut(&root_id, |a| a.status = AgentStatus::Ready);
                continue;
            }
            break;
        }

        let root = store.get(&root_id).expect("root agent always exists");
        if let Some(last) = root.history.last() {
            if last.role == forgeclaw_core::Role::Assistant {
                println!("{}", last.content);
            }
        }

        print!("> ");
        let _ = std::io::stdout().flush();
    }
}
