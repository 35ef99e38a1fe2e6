//! ドメイン層
//!
//! チャットリレーのビジネス概念（値オブジェクト、エンティティ、外部協調者の trait）を定義します。
//! Infrastructure 層・UI 層には依存しません。

pub mod entity;
pub mod error;
pub mod gateway;
pub mod repository;
pub mod value_object;

pub use entity::{ChatEvent, EventKind, Identity, MessageEvent, Room, TypingSignal};
pub use error::{ArchiveError, AuthError, DirectoryError, ValueObjectError};
pub use gateway::IdentityGateway;
pub use repository::{MessageArchive, RoomDirectory};
pub use value_object::{
    ConnectionId, ConnectionKey, EventId, MessageContent, RoomId, RoomName, Timestamp, UserId,
    Username,
};
