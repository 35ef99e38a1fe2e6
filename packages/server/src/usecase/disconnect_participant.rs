//! UseCase: 参加者切断処理

use crate::{
    domain::{ConnectionId, RoomId},
    hub::HubHandle,
};

use super::error::DisconnectError;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    hub: HubHandle,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }

    /// 参加者を Hub から登録解除
    ///
    /// 退出通知は Hub が送信します。同じ接続で二度呼び出しても問題ありません。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), DisconnectError> {
        self.hub.leave(connection_id, room_id).await?;
        Ok(())
    }
}
