//! Bridges the Agent Store to `forgeclaw-tools`' `spawn_agent` tool.
//!
//! Per §9 Design Notes, the spawned agent's system prompt must be the one in
//! effect *at the moment of the call*, not at registry construction time —
//! so this holds the generator closure and evaluates it fresh on every call,
//! rather than baking a prompt string in at construction.
//!
//! New agents are parented to the root. The `AgentSpawner` trait (already
//! fixed by `forgeclaw-tools`) does not thread the calling agent's id through
//! tool dispatch, and in this architecture only the root conversation ever
//! realistically calls `spawn_agent`/`wait_for_agents` — sub-agents run to
//! completion and report a result rather than spawning further children.

use crate::store::AgentStore;
use forgeclaw_tools::AgentSpawner;
use std::sync::Arc;

pub type PromptGenerator = Arc<dyn Fn() -> String + Send + Sync>;

pub struct KernelSpawner {
    store: Arc<AgentStore>,
    system_prompt_generator: PromptGenerator,
}

impl KernelSpawner {
    pub fn new(store: Arc<AgentStore>, system_prompt_generator: PromptGenerator) -> Self {
        Self { store, system_prompt_generator }
    }
}

#[async_trait::async_trait]
impl AgentSpawner for KernelSpawner {
    async fn spawn_agent(&self, role: String, prompt: String) -> Result<String, String> {
        let system_prompt = (self.system_prompt_generator)();
        let root_id = self.store.root_id().clone();
        let id = self.store.create_child(role, system_prompt, &prompt, root_id);
        Ok(id.to_string())
    }
}
