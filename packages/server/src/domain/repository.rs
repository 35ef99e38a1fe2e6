//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ArchiveError, DirectoryError, MessageEvent, Room, RoomId, RoomName};

/// Room Directory trait
///
/// ルームの永続的なカタログ。ルーム名の一意性はこの trait の実装が保証します。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// ルームを作成（同名のルームが存在する場合は `RoomAlreadyExists`）
    async fn create_room(&self, name: RoomName) -> Result<Room, DirectoryError>;

    /// ID でルームを取得
    async fn get_room(&self, id: RoomId) -> Result<Room, DirectoryError>;

    /// 全ルームを ID 順で取得
    async fn list_rooms(&self) -> Result<Vec<Room>, DirectoryError>;
}

/// Message Archive trait
///
/// 永続化された Text メッセージの追記専用ログ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageArchive: Send + Sync {
    /// メッセージを追記
    async fn append(&self, message: MessageEvent) -> Result<(), ArchiveError>;

    /// 指定ルームの直近 `limit` 件を **新しい順** で取得
    async fn recent(&self, room_id: RoomId, limit: usize)
    -> Result<Vec<MessageEvent>, ArchiveError>;
}
