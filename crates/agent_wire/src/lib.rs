//! Transport-free wire primitives for the agent-session protocol.
//!
//! This crate owns the frame envelope, outbound payload shapes, the
//! incremental frame codec, and boundary validation (session identifiers,
//! recoverable-error classification). It intentionally contains no socket
//! code and no client state: the session core decides what a frame means,
//! this crate only decides what a frame says.

pub mod codec;
pub mod error;
pub mod frame;
pub mod payload;
pub mod recoverable;
pub mod session_id;

pub use codec::{decode_frame, encode_frame};
pub use error::WireError;
pub use frame::{ApprovalRequest, ContentBlock, InboundFrame, TokenUsage};
pub use payload::{AbortFrame, ApprovalResponseFrame, CommandFrame, CommandOptions, ImagePayload};
pub use recoverable::is_recoverable_session_error;
pub use session_id::{is_valid_session_id, sanitize_session_id};
