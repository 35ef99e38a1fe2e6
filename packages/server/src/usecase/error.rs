//! UseCase 層のエラー定義

use thiserror::Error;

use crate::{
    domain::{DirectoryError, RoomId, ValueObjectError},
    hub::SubmitError,
};

/// 参加者接続時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 認証情報が提示されていない
    #[error("no credential presented")]
    MissingCredential,

    /// 認証情報が検証に失敗した
    #[error("credential rejected: {0}")]
    Unauthorized(String),

    /// 指定されたルームが存在しない
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// Room Directory または Hub が利用できない
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// 参加者切断時のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error("hub unavailable: {0}")]
    HubUnavailable(#[from] SubmitError),
}

/// メッセージ送信時のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// Hub の入力バッファが満杯、または Hub が停止している
    #[error("message not accepted: {0}")]
    NotAccepted(#[from] SubmitError),
}

/// ルーム作成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("invalid room name: {0}")]
    InvalidName(#[from] ValueObjectError),

    #[error("room '{0}' already exists")]
    AlreadyExists(String),

    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

/// ルーム一覧取得時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomsError {
    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

/// ルーム詳細取得時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DirectoryError> for CreateRoomError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::RoomAlreadyExists(name) => CreateRoomError::AlreadyExists(name),
            other => CreateRoomError::Unavailable(other.to_string()),
        }
    }
}

impl From<DirectoryError> for GetRoomDetailError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::RoomNotFound(id) => GetRoomDetailError::RoomNotFound(id),
            other => GetRoomDetailError::Unavailable(other.to_string()),
        }
    }
}
