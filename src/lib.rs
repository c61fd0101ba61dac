//! Client core for a remote coding-agent service.
//!
//! One persistent websocket carries every session's traffic. The crate owns
//! connection supervision (reconnect backoff, generation tokens), assembly
//! of the streamed response into stable message units, an at-most-one-in-
//! flight outbound command queue with retry, a stall watchdog, and the
//! approval / session-recovery sub-protocols. Host applications drive it
//! through [`AgentClient`] and consume the ordered [`AgentEvent`] stream.
//!
//! Wire-format concerns (frame decode/encode, session-id validation, the
//! recoverable-error heuristic) live in the `agent_wire` crate.

mod approvals;
mod assembler;
mod queue;
mod recovery;
mod session;
mod supervisor;
mod watchdog;

pub mod collaborators;
pub mod config;
pub mod error;
pub mod event;
pub mod transport;

pub use collaborators::{
    Collaborators, DiscardHistory, HistorySink, NotificationKind, Notifier, SettingsProvider,
    SilentNotifier,
};
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::AgentEvent;
pub use queue::CommandRequest;
pub use session::{spawn, AgentClient};
pub use supervisor::ConnectionState;
pub use transport::{Transport, TransportLink, WebSocketTransport};

pub use agent_wire::{ApprovalRequest, ContentBlock, ImagePayload, TokenUsage};
