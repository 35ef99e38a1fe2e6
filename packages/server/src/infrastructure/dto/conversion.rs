//! Conversion logic between DTOs and domain entities.

use chatrelay_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatEvent, EventKind, MessageEvent, Room, RoomId, TypingSignal};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<EventKind> for dto::MessageType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Text => dto::MessageType::Text,
            EventKind::Join => dto::MessageType::UserJoin,
            EventKind::Leave => dto::MessageType::UserLeft,
            EventKind::Typing => dto::MessageType::Typing,
        }
    }
}

impl From<&ChatEvent> for dto::OutboundEvent {
    fn from(event: &ChatEvent) -> Self {
        match event {
            ChatEvent::Text(m) | ChatEvent::Join(m) | ChatEvent::Leave(m) => {
                message_to_dto(m, event.kind())
            }
            ChatEvent::Typing(t) => typing_to_dto(t),
        }
    }
}

fn message_to_dto(message: &MessageEvent, kind: EventKind) -> dto::OutboundEvent {
    dto::OutboundEvent {
        id: message.id.to_string(),
        r#type: kind.into(),
        user_id: message.author.id.as_str().to_string(),
        username: message.author.name.as_str().to_string(),
        room_id: message.room_id.value(),
        content: Some(message.content.as_str().to_string()),
        timestamp: Some(timestamp_to_rfc3339(message.timestamp.value())),
        is_typing: None,
    }
}

fn typing_to_dto(signal: &TypingSignal) -> dto::OutboundEvent {
    dto::OutboundEvent {
        id: signal.id.to_string(),
        r#type: dto::MessageType::Typing,
        user_id: signal.author.id.as_str().to_string(),
        username: signal.author.name.as_str().to_string(),
        room_id: signal.room_id.value(),
        content: None,
        timestamp: None,
        is_typing: Some(signal.is_typing),
    }
}

/// Serialize an event into the JSON text sent over the wire
pub fn encode_event(event: &ChatEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&dto::OutboundEvent::from(event))
}

impl From<Room> for http::RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.value(),
            name: room.name.into_string(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl http::RoomMembersDto {
    pub fn new(room_id: RoomId, members: Vec<String>) -> Self {
        Self {
            room_id: room_id.value(),
            members,
        }
    }
}
