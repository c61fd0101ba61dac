use thiserror::Error;

/// Error taxonomy of the session core.
///
/// Nothing here is fatal to the process: transport failures feed the
/// reconnect path, decode failures drop the frame, and the remaining
/// variants surface as user-visible events while the client returns to an
/// idle state from which `connect()` and new commands are always valid.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint URL `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("liveness probe received no pong")]
    ProbeTimeout,

    #[error("not connected")]
    NotConnected,

    #[error("command delivery failed after {attempts} attempts")]
    DeliveryExhausted { attempts: u32 },

    #[error(transparent)]
    Wire(#[from] agent_wire::WireError),
}
