//! InMemory Room Directory 実装
//!
//! ドメイン層が定義する `RoomDirectory` trait の具体的な実装。
//! `BTreeMap` をインメモリ DB として使用し、ID は 1 から連番で採番します。

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chatrelay_shared::time::Clock;
use tokio::sync::RwLock;

use crate::domain::{DirectoryError, Room, RoomDirectory, RoomId, RoomName, Timestamp};

#[derive(Default)]
struct Catalog {
    rooms: BTreeMap<RoomId, Room>,
    last_id: u32,
}

/// インメモリ Room Directory 実装
pub struct InMemoryRoomDirectory {
    catalog: RwLock<Catalog>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomDirectory {
    /// 新しい InMemoryRoomDirectory を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            clock,
        }
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn create_room(&self, name: RoomName) -> Result<Room, DirectoryError> {
        let mut catalog = self.catalog.write().await;

        if catalog.rooms.values().any(|room| room.name == name) {
            return Err(DirectoryError::RoomAlreadyExists(name.into_string()));
        }

        let id = catalog
            .last_id
            .checked_add(1)
            .ok_or_else(|| DirectoryError::Unavailable("room id space exhausted".to_string()))?;
        catalog.last_id = id;

        let room = Room::new(RoomId::new(id), name, Timestamp::new(self.clock.now_millis()));
        catalog.rooms.insert(room.id, room.clone());
        tracing::debug!("Room {} '{}' created", room.id, room.name.as_str());

        Ok(room)
    }

    async fn get_room(&self, id: RoomId) -> Result<Room, DirectoryError> {
        let catalog = self.catalog.read().await;
        catalog
            .rooms
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::RoomNotFound(id))
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, DirectoryError> {
        let catalog = self.catalog.read().await;
        Ok(catalog.rooms.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomDirectory の create / get / list
    // - ルーム名の一意性
    //
    // 【なぜこのテストが必要か】
    // - デフォルトルーム (ID=1) の存在が WebSocket 接続の前提になる
    // - 重複作成が 409 に変換されるため、エラー種別が正しいことを保証する
    // ========================================

    fn create_test_directory() -> InMemoryRoomDirectory {
        InMemoryRoomDirectory::new(Arc::new(FixedClock::new(1_000)))
    }

    fn name(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_room_assigns_sequential_ids() {
        // テスト項目: ルーム ID は 1 から連番で採番される
        // given (前提条件):
        let directory = create_test_directory();

        // when (操作):
        let general = directory.create_room(name("General")).await.unwrap();
        let rust = directory.create_room(name("rust")).await.unwrap();

        // then (期待する結果):
        assert_eq!(general.id, RoomId::new(1));
        assert_eq!(rust.id, RoomId::new(2));
        assert_eq!(general.created_at, Timestamp::new(1_000));
    }

    #[tokio::test]
    async fn test_create_room_rejects_duplicate_name() {
        // テスト項目: 同名のルームは作成できない
        // given (前提条件):
        let directory = create_test_directory();
        directory.create_room(name("General")).await.unwrap();

        // when (操作):
        let result = directory.create_room(name("General")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DirectoryError::RoomAlreadyExists("General".to_string()))
        );
        assert_eq!(directory.list_rooms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_room_not_found() {
        // テスト項目: 存在しない ID は RoomNotFound になる
        // given (前提条件):
        let directory = create_test_directory();

        // when (操作):
        let result = directory.get_room(RoomId::new(42)).await;

        // then (期待する結果):
        assert_eq!(result, Err(DirectoryError::RoomNotFound(RoomId::new(42))));
    }

    #[tokio::test]
    async fn test_list_rooms_ordered_by_id() {
        // テスト項目: 一覧は ID 順で返される
        // given (前提条件):
        let directory = create_test_directory();
        directory.create_room(name("b")).await.unwrap();
        directory.create_room(name("a")).await.unwrap();

        // when (操作):
        let rooms = directory.list_rooms().await.unwrap();

        // then (期待する結果):
        let ids: Vec<u32> = rooms.iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(rooms[0].name.as_str(), "b");
    }
}
