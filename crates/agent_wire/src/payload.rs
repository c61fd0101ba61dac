use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Outbound command frame: `{command, options}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFrame {
    pub command: String,
    pub options: CommandOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOptions {
    pub cwd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImagePayload>,
}

/// Inline image attachment carried on a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub media_type: String,
    pub base64_data: String,
}

impl ImagePayload {
    /// Encodes raw image bytes into the wire shape.
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            base64_data: general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Outbound abort frame: `{sessionId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortFrame {
    pub session_id: String,
}

/// Outbound approval response: `{requestId, allow, alwaysAllow}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponseFrame {
    pub request_id: String,
    pub allow: bool,
    pub always_allow: bool,
}
