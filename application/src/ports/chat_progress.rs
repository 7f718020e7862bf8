//! Progress notification port for chat turns

use bestself_domain::AgentType;

/// Callbacks fired while a message is being handled.
///
/// Implementations live in the presentation layer (spinner, status line).
pub trait ChatProgressNotifier: Send + Sync {
    /// The coach started working on a reply
    fn on_thinking_start(&self, _agent: AgentType) {}

    /// The reply (or error) is ready
    fn on_thinking_end(&self) {}

    fn on_agent_switch(&self, _from: AgentType, _to: AgentType) {}

    /// The backend was unreachable and `pending` items now wait in the queue
    fn on_queued(&self, _pending: usize) {}

    /// The queue drained `flushed` items after connectivity came back
    fn on_flushed(&self, _flushed: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoChatProgress;

impl ChatProgressNotifier for NoChatProgress {}
