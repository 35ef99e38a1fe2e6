//! SQLite Message Archive 実装
//!
//! `recent` はルームで絞り込み、`ORDER BY timestamp DESC LIMIT ?` で
//! 新しい順に取得します。

use std::fmt::Display;

use async_trait::async_trait;
use sqlx::{
    Row,
    sqlite::{SqlitePool, SqliteRow},
};
use uuid::Uuid;

use crate::domain::{
    ArchiveError, EventId, Identity, MessageArchive, MessageContent, MessageEvent, RoomId,
    Timestamp, UserId, Username,
};

/// SQLite Message Archive 実装
pub struct SqliteMessageArchive {
    pool: SqlitePool,
}

impl SqliteMessageArchive {
    /// 新しい SqliteMessageArchive を作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageArchive for SqliteMessageArchive {
    async fn append(&self, message: MessageEvent) -> Result<(), ArchiveError> {
        sqlx::query(
            "INSERT INTO messages (id, room_id, user_id, username, content, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(i64::from(message.room_id.value()))
        .bind(message.author.id.as_str())
        .bind(message.author.name.as_str())
        .bind(message.content.as_str())
        .bind(message.timestamp.value())
        .execute(&self.pool)
        .await
        .map_err(|e| ArchiveError::PersistenceFailed(e.to_string()))?;

        Ok(())
    }

    async fn recent(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<MessageEvent>, ArchiveError> {
        let rows = sqlx::query(
            "SELECT id, room_id, user_id, username, content, timestamp FROM messages
             WHERE room_id = ?
             ORDER BY timestamp DESC, seq DESC
             LIMIT ?",
        )
        .bind(i64::from(room_id.value()))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(message_from_row).collect()
    }
}

fn message_from_row(row: &SqliteRow) -> Result<MessageEvent, ArchiveError> {
    let id: String = row.try_get("id").map_err(unavailable)?;
    let room_id: i64 = row.try_get("room_id").map_err(unavailable)?;
    let user_id: String = row.try_get("user_id").map_err(unavailable)?;
    let username: String = row.try_get("username").map_err(unavailable)?;
    let content: String = row.try_get("content").map_err(unavailable)?;
    let timestamp: i64 = row.try_get("timestamp").map_err(unavailable)?;

    Ok(MessageEvent {
        id: EventId::from_uuid(Uuid::parse_str(&id).map_err(unavailable)?),
        author: Identity::new(
            UserId::new(user_id).map_err(unavailable)?,
            Username::new(username).map_err(unavailable)?,
        ),
        room_id: RoomId::new(u32::try_from(room_id).map_err(unavailable)?),
        content: MessageContent::new(content).map_err(unavailable)?,
        timestamp: Timestamp::new(timestamp),
    })
}

fn unavailable(e: impl Display) -> ArchiveError {
    ArchiveError::Unavailable(e.to_string())
}
