//! InMemory Message Archive 実装
//!
//! 追記専用の `Vec` をログとして使用します。

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ArchiveError, MessageArchive, MessageEvent, RoomId};

/// インメモリ Message Archive 実装
#[derive(Default)]
pub struct InMemoryMessageArchive {
    log: RwLock<Vec<MessageEvent>>,
}

impl InMemoryMessageArchive {
    /// 新しい InMemoryMessageArchive を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みメッセージ数
    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }
}

#[async_trait]
impl MessageArchive for InMemoryMessageArchive {
    async fn append(&self, message: MessageEvent) -> Result<(), ArchiveError> {
        self.log.write().await.push(message);
        Ok(())
    }

    async fn recent(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<MessageEvent>, ArchiveError> {
        let log = self.log.read().await;
        // 新しい順
        Ok(log
            .iter()
            .rev()
            .filter(|message| message.room_id == room_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
