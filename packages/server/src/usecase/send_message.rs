//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() / notify_typing() メソッド
//! - 受信したメッセージに送信者・ルーム・時刻を付与して Hub に投入する処理
//!
//! ### なぜこのテストが必要か
//! - クライアントが送ってきた内容ではなく、認証済みの Identity が送信者になることを保証
//! - Hub が受け付けられない場合にエラーとして返ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：Text がルーム全員に届く、Typing が送信者以外に届く
//! - 異常系：Hub の入力バッファが満杯、Hub が停止している

use std::sync::Arc;

use chatrelay_shared::time::Clock;

use crate::{
    domain::{ChatEvent, ConnectionId, Identity, MessageContent, RoomId, Timestamp, TypingSignal},
    hub::HubHandle,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    hub: HubHandle,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(hub: HubHandle, clock: Arc<dyn Clock>) -> Self {
        Self { hub, clock }
    }

    /// メッセージ送信を実行
    ///
    /// 待たずに投入します。Hub が受け付けられない場合は破棄してエラーを返します。
    ///
    /// # Arguments
    ///
    /// * `origin` - 受信した接続の ID（参加済みでなければ Hub が破棄）
    /// * `author` - 接続時に認証された送信者
    /// * `room_id` - 接続先のルーム
    /// * `content` - メッセージ本文
    pub fn execute(
        &self,
        origin: ConnectionId,
        author: &Identity,
        room_id: RoomId,
        content: MessageContent,
    ) -> Result<(), SendMessageError> {
        let timestamp = Timestamp::new(self.clock.now_millis());
        let event = ChatEvent::text(author.clone(), room_id, content, timestamp);
        self.hub.try_broadcast(origin, event)?;
        Ok(())
    }

    /// タイピング状態を通知
    pub fn notify_typing(
        &self,
        author: &Identity,
        room_id: RoomId,
        is_typing: bool,
    ) -> Result<(), SendMessageError> {
        self.hub
            .try_typing(TypingSignal::new(author.clone(), room_id, is_typing))?;
        Ok(())
    }
}
