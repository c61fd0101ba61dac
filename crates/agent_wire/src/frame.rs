use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Latest token accounting reported by the server. Last value wins; the
/// client never reconciles it against history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub used: u64,
    pub total: u64,
}

/// Permission request raised by the agent before running a gated tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub tool_name: String,
    pub description: Option<String>,
    pub input: Option<Value>,
}

/// One ordered content block of an assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: Option<String>,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: Option<String>,
        content: Value,
        is_error: bool,
    },
    /// Unknown block type retained so callers can log what they dropped.
    Unknown {
        block_type: String,
        payload: Value,
    },
}

/// Decoded inbound frame envelope: `{type, sessionId?, data?, error?}`.
///
/// Session identifiers are carried raw here; callers validate them through
/// [`crate::session_id::sanitize_session_id`] before binding anything.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    SessionCreated {
        session_id: Option<String>,
    },
    Response {
        session_id: Option<String>,
        blocks: Vec<ContentBlock>,
    },
    TokenBudget {
        usage: TokenUsage,
    },
    Complete {
        session_id: Option<String>,
    },
    Error {
        code: Option<String>,
        message: String,
    },
    Aborted {
        session_id: Option<String>,
    },
    PermissionRequest {
        request: ApprovalRequest,
    },
    SessionsUpdated {
        data: Value,
    },
    ProjectsUpdated {
        data: Value,
    },
    /// Unknown frame type; the client logs it and drops it.
    Unknown {
        frame_type: String,
        payload: Value,
    },
}

impl InboundFrame {
    /// Wire name of this frame's type.
    pub fn frame_type(&self) -> &str {
        match self {
            Self::SessionCreated { .. } => "session-created",
            Self::Response { .. } => "claude-response",
            Self::TokenBudget { .. } => "token-budget",
            Self::Complete { .. } => "claude-complete",
            Self::Error { .. } => "claude-error",
            Self::Aborted { .. } => "session-aborted",
            Self::PermissionRequest { .. } => "permission-request",
            Self::SessionsUpdated { .. } => "sessions-updated",
            Self::ProjectsUpdated { .. } => "projects_updated",
            Self::Unknown { frame_type, .. } => frame_type,
        }
    }

    /// Returns true when this frame terminates an open turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete { .. } | Self::Error { .. } | Self::Aborted { .. }
        )
    }
}
