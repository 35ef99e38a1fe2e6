//! エンティティ
//!
//! - `Identity`: 認証済みユーザー
//! - `Room`: Room Directory が管理するルーム
//! - `ChatEvent`: Hub を経由して配信されるイベント（Text / Join / Leave / Typing）

use super::{ConnectionKey, EventId, MessageContent, RoomId, RoomName, Timestamp, UserId, Username};

/// 認証済みユーザー
///
/// Identity Gateway が発行し、セッション中は変更されません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub name: Username,
}

impl Identity {
    pub fn new(id: UserId, name: Username) -> Self {
        Self { id, name }
    }

    /// Membership Index 用のキーを導出
    pub fn connection_key(&self) -> ConnectionKey {
        ConnectionKey::new(&self.id, &self.name)
    }
}

/// ルーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, name: RoomName, created_at: Timestamp) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }
}

/// イベントの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Text,
    Join,
    Leave,
    Typing,
}

impl EventKind {
    /// ワイヤ上の `type` 値
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Text => "text",
            EventKind::Join => "user_join",
            EventKind::Leave => "user_left",
            EventKind::Typing => "typing",
        }
    }
}

/// Text / Join / Leave が共通で持つ内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub id: EventId,
    pub author: Identity,
    pub room_id: RoomId,
    pub content: MessageContent,
    pub timestamp: Timestamp,
}

impl MessageEvent {
    pub fn new(
        author: Identity,
        room_id: RoomId,
        content: MessageContent,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: EventId::generate(),
            author,
            room_id,
            content,
            timestamp,
        }
    }
}

/// タイピング状態の通知（永続化されない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSignal {
    pub id: EventId,
    pub author: Identity,
    pub room_id: RoomId,
    pub is_typing: bool,
}

impl TypingSignal {
    pub fn new(author: Identity, room_id: RoomId, is_typing: bool) -> Self {
        Self {
            id: EventId::generate(),
            author,
            room_id,
            is_typing,
        }
    }
}

/// Hub を経由して配信されるイベント
///
/// 永続化されるのは `Text` のみです。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Text(MessageEvent),
    Join(MessageEvent),
    Leave(MessageEvent),
    Typing(TypingSignal),
}

impl ChatEvent {
    pub fn text(
        author: Identity,
        room_id: RoomId,
        content: MessageContent,
        timestamp: Timestamp,
    ) -> Self {
        ChatEvent::Text(MessageEvent::new(author, room_id, content, timestamp))
    }

    /// "<name> joined the chat" を本文に持つ Join イベントを生成
    pub fn joined(author: Identity, room_id: RoomId, timestamp: Timestamp) -> Self {
        let content = MessageContent::notice(&author.name, "joined the chat");
        ChatEvent::Join(MessageEvent::new(author, room_id, content, timestamp))
    }

    /// "<name> left the chat" を本文に持つ Leave イベントを生成
    pub fn left(author: Identity, room_id: RoomId, timestamp: Timestamp) -> Self {
        let content = MessageContent::notice(&author.name, "left the chat");
        ChatEvent::Leave(MessageEvent::new(author, room_id, content, timestamp))
    }

    pub fn typing(author: Identity, room_id: RoomId, is_typing: bool) -> Self {
        ChatEvent::Typing(TypingSignal::new(author, room_id, is_typing))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::Text(_) => EventKind::Text,
            ChatEvent::Join(_) => EventKind::Join,
            ChatEvent::Leave(_) => EventKind::Leave,
            ChatEvent::Typing(_) => EventKind::Typing,
        }
    }

    pub fn room_id(&self) -> RoomId {
        match self {
            ChatEvent::Text(m) | ChatEvent::Join(m) | ChatEvent::Leave(m) => m.room_id,
            ChatEvent::Typing(t) => t.room_id,
        }
    }

    pub fn author(&self) -> &Identity {
        match self {
            ChatEvent::Text(m) | ChatEvent::Join(m) | ChatEvent::Leave(m) => &m.author,
            ChatEvent::Typing(t) => &t.author,
        }
    }

    /// Message Archive に渡すべきイベントなら、その内容を返す
    pub fn persistable(&self) -> Option<&MessageEvent> {
        match self {
            ChatEvent::Text(m) => Some(m),
            _ => None,
        }
    }
}
