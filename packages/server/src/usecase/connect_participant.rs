//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::admit() / execute() メソッド
//! - 認証とルーム存在確認（アップグレード前）、Hub への登録（アップグレード後）
//!
//! ### なぜこのテストが必要か
//! - 認証失敗・ルーム不在のときに接続を確立させないことを保証
//! - エラー種別が HTTP ステータス（401 / 404 / 503）に正しく対応することを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なトークンと既存ルーム
//! - 異常系：トークン無し、無効なトークン、存在しないルーム、Directory 障害
//! - エッジケース：空白のみのトークン

use std::sync::Arc;

use crate::{
    domain::{
        AuthError, ConnectionId, DirectoryError, Identity, IdentityGateway, Room, RoomDirectory,
        RoomId,
    },
    hub::{HubHandle, JoinRequest, OutboundQueue},
};

use super::error::ConnectError;

/// 接続が許可された参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub identity: Identity,
    pub room: Room,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Identity Gateway（認証の抽象化）
    identity_gateway: Arc<dyn IdentityGateway>,
    /// Room Directory（ルームカタログの抽象化）
    room_directory: Arc<dyn RoomDirectory>,
    hub: HubHandle,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        identity_gateway: Arc<dyn IdentityGateway>,
        room_directory: Arc<dyn RoomDirectory>,
        hub: HubHandle,
    ) -> Self {
        Self {
            identity_gateway,
            room_directory,
            hub,
        }
    }

    /// 接続を許可するかどうかを判定
    ///
    /// WebSocket へのアップグレード前に呼び出します。
    ///
    /// # Arguments
    ///
    /// * `credential` - クエリまたは Authorization ヘッダーから取り出したトークン
    /// * `room_id` - 参加するルーム
    ///
    /// # Returns
    ///
    /// * `Ok(Admission)` - 認証済みユーザーと参加先ルーム
    /// * `Err(ConnectError)` - 接続を拒否する理由
    pub async fn admit(
        &self,
        credential: Option<&str>,
        room_id: RoomId,
    ) -> Result<Admission, ConnectError> {
        // 1. 認証
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ConnectError::MissingCredential)?;
        let identity = self
            .identity_gateway
            .authenticate(credential)
            .await
            .map_err(|e| match e {
                AuthError::MissingCredential => ConnectError::MissingCredential,
                AuthError::Rejected(reason) => ConnectError::Unauthorized(reason),
            })?;

        // 2. ルームの存在確認
        let room = self
            .room_directory
            .get_room(room_id)
            .await
            .map_err(|e| match e {
                DirectoryError::RoomNotFound(id) => ConnectError::RoomNotFound(id),
                other => ConnectError::Unavailable(other.to_string()),
            })?;

        Ok(Admission { identity, room })
    }

    /// 参加者を Hub に登録
    ///
    /// 登録後、履歴のリプレイと参加通知は Hub が行います。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        admission: &Admission,
        queue: OutboundQueue,
    ) -> Result<(), ConnectError> {
        self.hub
            .join(JoinRequest {
                connection_id,
                identity: admission.identity.clone(),
                room_id: admission.room.id,
                queue,
            })
            .await
            .map_err(|e| ConnectError::Unavailable(e.to_string()))
    }
}
