use std::collections::VecDeque;
use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use agent_wire::ImagePayload;

/// Send attempts budgeted per command before it is dropped.
pub(crate) const MAX_SEND_ATTEMPTS: u32 = 3;
/// Fixed retry schedule, indexed by the number of failed attempts so far.
pub(crate) const RETRY_SCHEDULE: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];
/// How long a command waits for a just-triggered connect before failing.
pub(crate) const SEND_GRACE_DELAY: Duration = Duration::from_millis(500);

/// Command submission shape accepted from the host application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandRequest {
    pub command: String,
    pub project_path: String,
    pub model: Option<String>,
    pub permission_mode: Option<String>,
    pub images: Vec<ImagePayload>,
}

/// A queued command, owned exclusively by the outbound queue.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingCommand {
    pub id: Uuid,
    pub payload: String,
    pub project_path: String,
    /// Pinned session scope (reattachment probes); `None` resolves to the
    /// currently bound session at send time.
    pub session_id: Option<String>,
    pub permission_mode: Option<String>,
    pub images: Vec<ImagePayload>,
    pub model: Option<String>,
    pub attempts: u32,
    pub created_at: OffsetDateTime,
}

impl PendingCommand {
    pub fn from_request(request: CommandRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: request.command,
            project_path: request.project_path,
            session_id: None,
            permission_mode: request.permission_mode,
            images: request.images,
            model: request.model,
            attempts: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Outcome of recording a transport-level send failure for the head command.
#[derive(Debug, PartialEq)]
pub(crate) enum SendFailure {
    /// Retry the head after the given delay.
    Retry { command_id: Uuid, delay: Duration },
    /// Retry budget exhausted; the command was dropped from the queue.
    Exhausted(Box<PendingCommand>),
}

/// Serialized command queue with at-most-one command in flight.
///
/// Successful transmission removes the head immediately, but the queue does
/// not advance to the next command until the current turn's terminal event:
/// the protocol has no pipelining, one agent turn per session.
#[derive(Debug, Default)]
pub(crate) struct OutboundQueue {
    entries: VecDeque<PendingCommand>,
    turn_open: bool,
    retry_pending: bool,
    grace_pending: bool,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: PendingCommand) {
        self.entries.push_back(command);
    }

    pub fn head(&self) -> Option<&PendingCommand> {
        self.entries.front()
    }

    pub fn is_turn_open(&self) -> bool {
        self.turn_open
    }

    /// True when the head may be handed to the transport right now.
    pub fn can_send(&self) -> bool {
        !self.entries.is_empty() && !self.turn_open && !self.retry_pending && !self.grace_pending
    }

    /// Marks the head as transmitted: removed from the queue, turn open.
    pub fn mark_sent(&mut self) -> Option<PendingCommand> {
        let sent = self.entries.pop_front()?;
        self.turn_open = true;
        Some(sent)
    }

    /// Records a failed send of the head command.
    pub fn record_failure(&mut self) -> Option<SendFailure> {
        let head = self.entries.front_mut()?;
        head.attempts += 1;

        if head.attempts < MAX_SEND_ATTEMPTS {
            self.retry_pending = true;
            Some(SendFailure::Retry {
                command_id: head.id,
                delay: RETRY_SCHEDULE[(head.attempts - 1) as usize],
            })
        } else {
            let dropped = self.entries.pop_front()?;
            Some(SendFailure::Exhausted(Box::new(dropped)))
        }
    }

    /// Consumes a fired retry timer. Returns true when the timer still applies
    /// to the current head and a send should be attempted.
    pub fn retry_due(&mut self, command_id: Uuid) -> bool {
        if !self.retry_pending || !self.head().is_some_and(|head| head.id == command_id) {
            return false;
        }
        self.retry_pending = false;
        !self.turn_open
    }

    pub fn begin_grace(&mut self) {
        self.grace_pending = true;
    }

    /// Consumes a fired grace timer for the head command.
    pub fn grace_due(&mut self, command_id: Uuid) -> bool {
        if !self.grace_pending || !self.head().is_some_and(|head| head.id == command_id) {
            return false;
        }
        self.grace_pending = false;
        !self.turn_open
    }

    /// Drops the head without consuming a retry (grace-path failure).
    pub fn drop_head(&mut self) -> Option<PendingCommand> {
        self.entries.pop_front()
    }

    /// Closes the open turn. Returns true when another command is queued.
    pub fn turn_finished(&mut self) -> bool {
        self.turn_open = false;
        !self.entries.is_empty()
    }

    /// Connection-loss reset: whatever was in flight is no longer arriving.
    pub fn abort_turn(&mut self) {
        self.turn_open = false;
    }
}
