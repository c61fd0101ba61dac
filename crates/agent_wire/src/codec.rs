use serde::Serialize;
use serde_json::Value;

use crate::error::WireError;
use crate::frame::{ApprovalRequest, ContentBlock, InboundFrame, TokenUsage};

/// Decodes one inbound text frame into its envelope.
///
/// Decoding is tolerant: optional fields default instead of failing, and an
/// unrecognized `type` maps to [`InboundFrame::Unknown`] so the caller can log
/// and drop it without disturbing the session.
pub fn decode_frame(text: &str) -> Result<InboundFrame, WireError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(WireError::NotAnObject);
    }

    let Some(frame_type) = value.get("type").and_then(Value::as_str) else {
        return Err(WireError::MissingType);
    };

    let session_id = string_field(&value, "sessionId");

    Ok(match frame_type {
        "session-created" => InboundFrame::SessionCreated { session_id },
        "claude-response" => InboundFrame::Response {
            session_id,
            blocks: content_blocks(value.get("data")),
        },
        "token-budget" => InboundFrame::TokenBudget {
            usage: token_usage(value.get("data")),
        },
        "claude-complete" => InboundFrame::Complete { session_id },
        "claude-error" => {
            let (code, message) = error_fields(&value);
            InboundFrame::Error { code, message }
        }
        "session-aborted" => InboundFrame::Aborted { session_id },
        "permission-request" => InboundFrame::PermissionRequest {
            request: approval_request(value.get("data")),
        },
        "sessions-updated" => InboundFrame::SessionsUpdated {
            data: value.get("data").cloned().unwrap_or(Value::Null),
        },
        "projects_updated" => InboundFrame::ProjectsUpdated {
            data: value.get("data").cloned().unwrap_or(Value::Null),
        },
        _ => InboundFrame::Unknown {
            frame_type: frame_type.to_string(),
            payload: value,
        },
    })
}

/// Serializes an outbound frame to its wire text.
pub fn encode_frame<T: Serialize>(frame: &T) -> Result<String, WireError> {
    serde_json::to_string(frame).map_err(WireError::Encode)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Locates the content-block array of an assistant payload.
///
/// The server wraps blocks either as `data.message.content` (assistant turn
/// envelopes) or as a bare `data.content`; a plain string payload becomes a
/// single text block.
fn content_blocks(data: Option<&Value>) -> Vec<ContentBlock> {
    let Some(data) = data else {
        return Vec::new();
    };

    if let Some(text) = data.as_str() {
        return vec![ContentBlock::Text {
            text: text.to_string(),
        }];
    }

    let content = data
        .get("message")
        .and_then(|message| message.get("content"))
        .or_else(|| data.get("content"));

    match content {
        Some(Value::Array(items)) => items.iter().map(content_block).collect(),
        Some(Value::String(text)) => vec![ContentBlock::Text { text: text.clone() }],
        _ => Vec::new(),
    }
}

fn content_block(item: &Value) -> ContentBlock {
    let block_type = item.get("type").and_then(Value::as_str).unwrap_or("");

    match block_type {
        "text" => ContentBlock::Text {
            text: string_field(item, "text").unwrap_or_default(),
        },
        "thinking" => ContentBlock::Thinking {
            thinking: string_field(item, "thinking").unwrap_or_default(),
        },
        "tool_use" => ContentBlock::ToolUse {
            id: string_field(item, "id"),
            name: string_field(item, "name").unwrap_or_default(),
            input: item.get("input").cloned().unwrap_or(Value::Null),
        },
        "tool_result" => ContentBlock::ToolResult {
            tool_use_id: string_field(item, "tool_use_id"),
            content: item.get("content").cloned().unwrap_or(Value::Null),
            is_error: item
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        _ => ContentBlock::Unknown {
            block_type: block_type.to_string(),
            payload: item.clone(),
        },
    }
}

fn token_usage(data: Option<&Value>) -> TokenUsage {
    let Some(data) = data else {
        return TokenUsage::default();
    };

    TokenUsage {
        used: data.get("used").and_then(Value::as_u64).unwrap_or(0),
        total: data.get("total").and_then(Value::as_u64).unwrap_or(0),
    }
}

/// Error frames carry either a bare string or `{code, message}` under `error`.
fn error_fields(value: &Value) -> (Option<String>, String) {
    match value.get("error") {
        Some(Value::String(message)) => (None, message.clone()),
        Some(error @ Value::Object(_)) => {
            let code = string_field(error, "code");
            let message = string_field(error, "message")
                .unwrap_or_else(|| "unknown server error".to_string());
            (code, message)
        }
        _ => (None, "unknown server error".to_string()),
    }
}

fn approval_request(data: Option<&Value>) -> ApprovalRequest {
    let empty = Value::Null;
    let data = data.unwrap_or(&empty);

    ApprovalRequest {
        id: string_field(data, "id")
            .or_else(|| string_field(data, "requestId"))
            .unwrap_or_default(),
        tool_name: string_field(data, "toolName")
            .or_else(|| string_field(data, "tool_name"))
            .unwrap_or_default(),
        description: string_field(data, "description"),
        input: data.get("input").cloned(),
    }
}
