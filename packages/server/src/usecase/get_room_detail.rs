//! UseCase: ルーム詳細取得処理
//!
//! ルームのカタログ情報に、Membership Index から読んだ現在の参加者を合わせて返します。

use std::sync::Arc;

use crate::{
    domain::{ConnectionKey, Room, RoomDirectory, RoomId},
    hub::HubHandle,
};

use super::error::GetRoomDetailError;

/// ルームと現在の参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub room: Room,
    /// 参加中の接続キー（ソート済み）
    pub members: Vec<ConnectionKey>,
}

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    hub: HubHandle,
}

impl GetRoomDetailUseCase {
    pub fn new(room_directory: Arc<dyn RoomDirectory>, hub: HubHandle) -> Self {
        Self {
            room_directory,
            hub,
        }
    }

    /// ルーム詳細取得を実行
    ///
    /// # Returns
    ///
    /// * `Ok(RoomDetail)` - ルームと参加者
    /// * `Err(GetRoomDetailError::RoomNotFound)` - ルームが存在しない
    pub async fn execute(&self, room_id: RoomId) -> Result<RoomDetail, GetRoomDetailError> {
        let room = self.room_directory.get_room(room_id).await?;
        let members = self.hub.membership().list(room_id).await;
        Ok(RoomDetail { room, members })
    }
}
