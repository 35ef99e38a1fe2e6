//! ドメイン層のエラー定義

use thiserror::Error;

use super::RoomId;

/// 値オブジェクトの生成時エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("room name is too long (max {max} characters, got {actual})")]
    RoomNameTooLong { max: usize, actual: usize },

    #[error("message content must not be empty")]
    EmptyMessageContent,
}

/// Identity Gateway のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// 資格情報が提示されなかった
    #[error("authentication token is required")]
    MissingCredential,

    /// 資格情報が無効、または期限切れ
    #[error("invalid or expired token: {0}")]
    Rejected(String),
}

/// Room Directory のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("room directory unavailable: {0}")]
    Unavailable(String),
}

/// Message Archive のエラー
///
/// どちらもログに記録されるだけで、クライアントには一切見えません。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    /// append に失敗した
    #[error("failed to persist message: {0}")]
    PersistenceFailed(String),

    /// recent の取得に失敗した
    #[error("message archive unavailable: {0}")]
    Unavailable(String),
}
