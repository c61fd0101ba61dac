use std::time::Duration;

use tracing::debug;

use agent_wire::ContentBlock;

use crate::event::AgentEvent;

/// Quiescence window before partial text becomes externally visible.
pub(crate) const TEXT_QUIESCENCE: Duration = Duration::from_millis(200);

/// Tool name the server uses for interactive questions; surfaced as a
/// question event rather than a generic tool invocation.
pub(crate) const QUESTION_TOOL_NAME: &str = "AskUserQuestion";

/// Reassembles token-by-token deltas into coherent message units.
///
/// Text accumulates in a buffer that is flushed to a stable value at three
/// points: after a quiescence window (partial visibility), immediately
/// before a tool invocation in the same turn (a text segment must close
/// before the tool call), and on any terminal event.
#[derive(Debug, Default)]
pub(crate) struct StreamAssembler {
    buffer: String,
    /// Debounce epoch; a flush tick carrying an older epoch is stale.
    flush_epoch: u64,
    last_tool_name: Option<String>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame's content blocks in array order.
    ///
    /// Returns the discrete events to emit plus whether text was appended
    /// (the caller arms the quiescence timer for the new epoch).
    pub fn apply_blocks(&mut self, blocks: Vec<ContentBlock>) -> (Vec<AgentEvent>, bool) {
        let mut events = Vec::new();
        let mut text_appended = false;

        for block in blocks {
            match block {
                ContentBlock::Text { text } => {
                    self.buffer.push_str(&text);
                    text_appended = true;
                }
                ContentBlock::Thinking { thinking } => {
                    events.push(AgentEvent::Thinking { text: thinking });
                }
                ContentBlock::ToolUse { id, name, input } => {
                    // Close the open text segment before the tool call.
                    if let Some(text) = self.commit() {
                        events.push(AgentEvent::TextCommitted { text });
                        text_appended = false;
                    }
                    self.last_tool_name = Some(name.clone());
                    if name == QUESTION_TOOL_NAME {
                        events.push(AgentEvent::QuestionPosed { id, input });
                    } else {
                        events.push(AgentEvent::ToolInvoked { id, name, input });
                    }
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    events.push(AgentEvent::ToolCompleted {
                        id: tool_use_id,
                        content,
                        is_error,
                    });
                }
                ContentBlock::Unknown {
                    block_type,
                    payload,
                } => {
                    debug!(%block_type, %payload, "dropping unknown content block");
                }
            }
        }

        (events, text_appended)
    }

    /// Closes the open text segment, if any.
    pub fn commit(&mut self) -> Option<String> {
        self.flush_epoch += 1;
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Current partial text, visible only through the debounced flush path.
    pub fn partial(&self) -> Option<&str> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(&self.buffer)
        }
    }

    /// Starts a new debounce window and returns its epoch.
    pub fn arm_flush(&mut self) -> u64 {
        self.flush_epoch += 1;
        self.flush_epoch
    }

    /// True when a flush tick with `epoch` is still the latest one armed.
    pub fn flush_current(&self, epoch: u64) -> bool {
        self.flush_epoch == epoch
    }

    pub fn last_tool_name(&self) -> Option<&str> {
        self.last_tool_name.as_deref()
    }

    /// Turn-end / connection-drop reset.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.flush_epoch += 1;
        self.last_tool_name = None;
    }
}
