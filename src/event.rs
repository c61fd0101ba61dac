use serde_json::Value;
use uuid::Uuid;

use agent_wire::{ApprovalRequest, TokenUsage};

use crate::supervisor::ConnectionState;

/// Structured event stream emitted by the session core.
///
/// Consumers (the chat view, the recovery bookkeeping, the history sink)
/// receive these in the exact order the actor produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Connection state transition.
    Connection { state: ConnectionState },
    /// A validated session identifier was bound; subsequent commands carry it.
    SessionBound { session_id: String },
    /// The bound identifier was cleared; the next command starts fresh.
    SessionCleared,
    /// The server invalidated the session; the identifier was cleared and the
    /// next command will transparently start a new session.
    SessionRecovered,
    /// Reattachment to a mid-processing session succeeded.
    Reattached { session_id: String },
    /// Debounced snapshot of the still-open text segment.
    TextUpdated { text: String },
    /// A text segment was closed, either by a tool boundary or a terminal
    /// event. This is the stable value the UI should keep.
    TextCommitted { text: String },
    Thinking { text: String },
    ToolInvoked {
        id: Option<String>,
        name: String,
        input: Value,
    },
    ToolCompleted {
        id: Option<String>,
        content: Value,
        is_error: bool,
    },
    /// The interactive-question tool, surfaced distinctly from generic tools.
    QuestionPosed { id: Option<String>, input: Value },
    ApprovalRequested { request: ApprovalRequest },
    TokenUsageUpdated { usage: TokenUsage },
    TurnCompleted,
    TurnFailed { message: String },
    TurnAborted,
    ModelSwitched { model: String },
    /// A queued command was dropped before it ever reached the server.
    CommandFailed { command_id: Uuid, message: String },
    SessionsUpdated { data: Value },
    ProjectsUpdated { data: Value },
}

impl AgentEvent {
    /// Returns true when this event closes an open turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::TurnCompleted
                | Self::TurnFailed { .. }
                | Self::TurnAborted
                | Self::SessionRecovered
        )
    }
}
