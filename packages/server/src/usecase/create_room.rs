//! UseCase: ルーム作成処理

use std::sync::Arc;

use crate::domain::{DirectoryError, Room, RoomDirectory, RoomId, RoomName};

use super::error::CreateRoomError;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// Room Directory（ルームカタログの抽象化）
    room_directory: Arc<dyn RoomDirectory>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(room_directory: Arc<dyn RoomDirectory>) -> Self {
        Self { room_directory }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `name` - ルーム名（前後の空白は除去される）
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 作成されたルーム
    /// * `Err(CreateRoomError)` - 名前が不正、または同名のルームが既に存在する
    pub async fn execute(&self, name: String) -> Result<Room, CreateRoomError> {
        let name = RoomName::new(name)?;
        let room = self.room_directory.create_room(name).await?;
        tracing::info!("Room {} '{}' created", room.id, room.name.as_str());
        Ok(room)
    }

    /// デフォルトルーム（ID 1）が無ければ作成
    ///
    /// 起動時に一度だけ呼び出します。`room_id` を省略した接続はこのルームに入ります。
    pub async fn ensure_default_room(&self, name: &str) -> Result<Room, CreateRoomError> {
        match self.room_directory.get_room(RoomId::DEFAULT).await {
            Ok(room) => Ok(room),
            Err(DirectoryError::RoomNotFound(_)) => {
                let room = self.execute(name.to_string()).await?;
                if room.id != RoomId::DEFAULT {
                    tracing::warn!(
                        "Default room was created with id {} instead of {}",
                        room.id,
                        RoomId::DEFAULT
                    );
                }
                Ok(room)
            }
            Err(e) => Err(e.into()),
        }
    }
}
