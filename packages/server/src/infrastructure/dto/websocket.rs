//! WebSocket frame DTOs.
//!
//! Inbound frames are classified by their `type` discriminator; a missing
//! `type` means a text message. Outbound events share one flat shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::MessageContent;

/// Wire-level event type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    UserJoin,
    UserLeft,
    Typing,
}

/// Event sent from the server to a client
///
/// The typing variant omits `content` and `timestamp` and carries `is_typing`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundEvent {
    pub id: String,
    pub r#type: MessageType,
    pub user_id: String,
    pub username: String,
    pub room_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// RFC 3339 (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_typing: Option<bool>,
}

/// Errors raised while decoding an inbound frame
///
/// None of them is fatal to the connection: the frame is dropped and the
/// session continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("text frame without content")]
    EmptyContent,
}

/// Inbound frame after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text { content: MessageContent },
    Typing { is_typing: bool },
}

impl InboundFrame {
    /// Decode and classify one frame.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Raw frame payload (UTF-8 JSON)
    /// * `max_size` - Maximum accepted payload size in bytes
    pub fn parse(bytes: &[u8], max_size: usize) -> Result<Self, FrameError> {
        if bytes.len() > max_size {
            return Err(FrameError::TooLarge {
                size: bytes.len(),
                max: max_size,
            });
        }

        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| FrameError::Malformed(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| FrameError::Malformed("expected a JSON object".to_string()))?;

        let kind = object.get("type").and_then(Value::as_str).unwrap_or("text");
        if kind == "typing" {
            let is_typing = object
                .get("is_typing")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            return Ok(InboundFrame::Typing { is_typing });
        }

        let content = object
            .get("content")
            .and_then(Value::as_str)
            .ok_or(FrameError::EmptyContent)?;
        let content =
            MessageContent::new(content.to_string()).map_err(|_| FrameError::EmptyContent)?;

        Ok(InboundFrame::Text { content })
    }
}
