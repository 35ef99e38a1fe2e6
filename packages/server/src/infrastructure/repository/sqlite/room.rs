//! SQLite Room Directory 実装
//!
//! ID は SQLite の `AUTOINCREMENT` で 1 から採番し、ルーム名の一意性は
//! `UNIQUE` 制約で保証します。

use std::{fmt::Display, sync::Arc};

use async_trait::async_trait;
use chatrelay_shared::time::Clock;
use sqlx::{
    Row,
    sqlite::{SqlitePool, SqliteRow},
};

use crate::domain::{DirectoryError, Room, RoomDirectory, RoomId, RoomName, Timestamp};

/// SQLite Room Directory 実装
pub struct SqliteRoomDirectory {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteRoomDirectory {
    /// 新しい SqliteRoomDirectory を作成
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl RoomDirectory for SqliteRoomDirectory {
    async fn create_room(&self, name: RoomName) -> Result<Room, DirectoryError> {
        let created_at = self.clock.now_millis();

        let result = sqlx::query("INSERT INTO rooms (name, created_at) VALUES (?, ?)")
            .bind(name.as_str())
            .bind(created_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                let id = room_id(done.last_insert_rowid())?;
                tracing::debug!("Room {} '{}' created", id, name.as_str());
                Ok(Room::new(id, name, Timestamp::new(created_at)))
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DirectoryError::RoomAlreadyExists(name.into_string()))
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn get_room(&self, id: RoomId) -> Result<Room, DirectoryError> {
        let row = sqlx::query("SELECT id, name, created_at FROM rooms WHERE id = ?")
            .bind(i64::from(id.value()))
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        match row {
            Some(row) => room_from_row(&row),
            None => Err(DirectoryError::RoomNotFound(id)),
        }
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, DirectoryError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM rooms ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(room_from_row).collect()
    }
}

fn room_from_row(row: &SqliteRow) -> Result<Room, DirectoryError> {
    let id: i64 = row.try_get("id").map_err(unavailable)?;
    let name: String = row.try_get("name").map_err(unavailable)?;
    let created_at: i64 = row.try_get("created_at").map_err(unavailable)?;

    Ok(Room::new(
        room_id(id)?,
        RoomName::new(name).map_err(unavailable)?,
        Timestamp::new(created_at),
    ))
}

fn room_id(raw: i64) -> Result<RoomId, DirectoryError> {
    u32::try_from(raw)
        .map(RoomId::new)
        .map_err(|_| DirectoryError::Unavailable(format!("room id {raw} is out of range")))
}

fn unavailable(e: impl Display) -> DirectoryError {
    DirectoryError::Unavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::sqlite::connect;
    use chatrelay_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - SqliteRoomDirectory の create / get / list
    // - UNIQUE 制約違反が RoomAlreadyExists に変換されること
    //
    // 【どのようにテストするか】
    // - `sqlite::memory:` のデータベースを使う
    // ========================================

    async fn create_test_directory() -> SqliteRoomDirectory {
        let pool = connect("sqlite::memory:").await.unwrap();
        SqliteRoomDirectory::new(pool, Arc::new(FixedClock::new(1_000)))
    }

    fn name(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_room_assigns_sequential_ids() {
        // テスト項目: ルーム ID は 1 から連番で採番される
        // given (前提条件):
        let directory = create_test_directory().await;

        // when (操作):
        let general = directory.create_room(name("General")).await.unwrap();
        let rust = directory.create_room(name("rust")).await.unwrap();

        // then (期待する結果):
        assert_eq!(general.id, RoomId::new(1));
        assert_eq!(rust.id, RoomId::new(2));
        assert_eq!(
            directory.get_room(RoomId::new(2)).await.unwrap(),
            Room::new(RoomId::new(2), name("rust"), Timestamp::new(1_000))
        );
    }

    #[tokio::test]
    async fn test_create_room_rejects_duplicate_name() {
        // テスト項目: 同名のルームは作成できない
        // given (前提条件):
        let directory = create_test_directory().await;
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
        let directory = create_test_directory().await;

        let result = directory.get_room(RoomId::new(42)).await;

        assert_eq!(result, Err(DirectoryError::RoomNotFound(RoomId::new(42))));
    }

    #[tokio::test]
    async fn test_list_rooms_ordered_by_id() {
        // テスト項目: 一覧は ID 順で返される
        // given (前提条件):
        let directory = create_test_directory().await;
        directory.create_room(name("b")).await.unwrap();
        directory.create_room(name("a")).await.unwrap();

        // when (操作):
        let rooms = directory.list_rooms().await.unwrap();

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
