//! The interactive confirmation prompt is terminal-rendering territory and
//! out of scope here (§1 Non-goals) — the Kernel only needs the decision
//! point `confirm_action` occupies in `kernel.py`, exposed as a collaborator
//! trait so a real CLI can supply a human-in-the-loop implementation later.

/// What kind of action is being confirmed, mirroring `kernel.py`'s
/// `action_type` ("CODE_EXECUTION" vs "TOOL_CALL").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ToolCall,
    CodeExecution,
}

#[async_trait::async_trait]
pub trait ActionConfirmer: Send + Sync {
    async fn confirm(&self, agent_id: &str, role: &str, kind: ActionKind, details: &str) -> bool;
}

/// Always confirms. Used whenever no human-in-the-loop UI is wired up —
/// equivalent to `auto_accept_code=True` for every action kind, not only code.
pub struct AutoAcceptConfirmer;

#[async_trait::async_trait]
impl ActionConfirmer for AutoAcceptConfirmer {
    async fn confirm(&self, _agent_id: &str, _role: &str, _kind: ActionKind, _details: &str) -> bool {
        true
    }
}
