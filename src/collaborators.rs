//! Collaborator seams consumed by the session core.
//!
//! Everything here is constructor-injected: the core never reaches for
//! process-wide state, which keeps the protocol machinery testable in
//! isolation.

use std::sync::Arc;
use std::time::Duration;

use crate::event::AgentEvent;
use crate::watchdog::DEFAULT_PROCESSING_TIMEOUT;

/// Live settings source. Values are re-read at the moment of use so user
/// changes (for example a longer processing timeout) apply without a restart.
pub trait SettingsProvider: Send + Sync + 'static {
    /// Websocket endpoint of the agent service.
    fn endpoint_url(&self) -> String;

    /// Stall budget for an in-flight turn.
    fn processing_timeout(&self) -> Duration {
        DEFAULT_PROCESSING_TIMEOUT
    }

    /// Model applied to commands that do not name one.
    fn default_model(&self) -> Option<String> {
        None
    }

    /// Permission mode applied to commands that do not name one.
    fn default_permission_mode(&self) -> Option<String> {
        None
    }
}

/// Write-only persistence for chat history. The core pushes every emitted
/// event; storage layout is entirely the collaborator's concern.
pub trait HistorySink: Send + Sync + 'static {
    fn append(&self, session_id: Option<&str>, event: &AgentEvent);
}

/// Events worth alerting on while the host application is backgrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TurnCompleted,
    ApprovalRequested,
    QuestionPosed,
}

/// Local-notification collaborator. Invoked only while the host application
/// reports itself backgrounded.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, kind: NotificationKind, body: &str);
}

/// Bundle of collaborator handles passed to [`crate::session::spawn`].
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn HistorySink>,
    pub notifier: Arc<dyn Notifier>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            history: Arc::new(DiscardHistory),
            notifier: Arc::new(SilentNotifier),
        }
    }
}

/// History sink for hosts that persist elsewhere (or not at all).
pub struct DiscardHistory;

impl HistorySink for DiscardHistory {
    fn append(&self, _session_id: Option<&str>, _event: &AgentEvent) {}
}

/// Notifier for hosts without a notification surface.
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _kind: NotificationKind, _body: &str) {}
}
