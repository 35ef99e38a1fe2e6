//! UseCase: ルーム一覧取得処理

use std::sync::Arc;

use crate::domain::{Room, RoomDirectory};

use super::error::GetRoomsError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    room_directory: Arc<dyn RoomDirectory>,
}

impl GetRoomsUseCase {
    pub fn new(room_directory: Arc<dyn RoomDirectory>) -> Self {
        Self { room_directory }
    }

    /// 全ルームを ID 順で取得
    pub async fn execute(&self) -> Result<Vec<Room>, GetRoomsError> {
        self.room_directory
            .list_rooms()
            .await
            .map_err(|e| GetRoomsError::Unavailable(e.to_string()))
    }
}
