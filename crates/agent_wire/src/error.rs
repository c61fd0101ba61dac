use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("inbound frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inbound frame is not a JSON object")]
    NotAnObject,

    #[error("inbound frame has no string `type` field")]
    MissingType,

    #[error("failed to encode outbound frame: {0}")]
    Encode(#[source] serde_json::Error),
}
