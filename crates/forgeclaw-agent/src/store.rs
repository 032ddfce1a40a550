//! Agent Store: a concurrent map keyed by agent id. Grounded on
//! `agenticlaw-agent`'s `SubagentRegistry` (`DashMap`-backed, insert-order FIFO
//! scan for "next ready") rather than `original_source/internal/agent_manager.py`'s
//! single-threaded dict, since every suspension point in the Kernel is async.

use dashmap::DashMap;
use forgeclaw_core::{Agent, AgentId, AgentStatus};

/// Thread-safe map of every agent the process has created, plus the id of
/// the one root agent. Reads (status polling, `get`) never block on a writer
/// holding only a short-lived insert/transition lock.
pub struct AgentStore {
    agents: DashMap<AgentId, Agent>,
    root_id: AgentId,
}

impl AgentStore {
    /// Creates the store and its root agent (fixed id `"main"`, status `DONE`
    /// until the first user turn) in one step — `AgentId::main()` is not a
    /// generated id, it must exist for the lifetime of the process.
    pub fn new(role: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let root_id = AgentId::main();
        let root = Agent::new(root_id.clone(), role, system_prompt, None, None, true);
        let agents = DashMap::new();
        agents.insert(root_id.clone(), root);
        Self { agents, root_id }
    }

    pub fn root_id(&self) -> &AgentId {
        &self.root_id
    }

    /// Creates and inserts a new child agent, returning its generated id.
    pub fn create_child(
        &self,
        role: impl Into<String>,
        system_prompt: impl Into<String>,
        initial_prompt: &str,
        parent_id: AgentId,
    ) -> AgentId {
        let id = AgentId::generate();
        let agent = Agent::new(id.clone(), role, system_prompt, Some(initial_prompt), Some(parent_id), false);
        tracing::info!(agent_id = %id, role = %agent.role, "agent created");
        self.agents.insert(id.clone(), agent);
        id
    }

    pub fn get(&self, id: &AgentId) -> Option<Agent> {
        self.agents.get(id).map(|a| a.clone())
    }

    /// Applies `f` to the stored agent in place, without cloning its history.
    pub fn with_mut<R>(&self, id: &AgentId, f: impl FnOnce(&mut Agent) -> R) -> Option<R> {
        self.agents.get_mut(id).map(|mut a| f(&mut *a))
    }

    /// First `READY` agent in insertion order, matching the original's simple
    /// FIFO scan. `DashMap` iteration order is not literally insertion order,
    /// so entries carry no extra index here: the scheduler never has more
    /// than a handful of concurrently-READY agents, and picking any one of
    /// them first is equally correct per the ordering guarantees in §5 (only
    /// per-agent turn order is guaranteed, not cross-agent pick order).
    pub fn next_ready(&self) -> Option<AgentId> {
        self.agents.iter().find(|e| e.status == AgentStatus::Ready).map(|e| e.key().clone())
    }

    /// All direct children of `parent_id`.
    pub fn children_of(&self, parent_id: &AgentId) -> Vec<Agent> {
        self.agents
            .iter()
            .filter(|e| e.parent_id.as_ref() == Some(parent_id))
            .map(|e| e.clone())
            .collect()
    }

    /// True when every direct child of `parent_id` has reached `DONE`.
    pub fn all_children_done(&self, parent_id: &AgentId) -> bool {
        self.children_of(parent_id).iter().all(|c| c.status == AgentStatus::Done)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
