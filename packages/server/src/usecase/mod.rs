//! UseCase 層
//!
//! ドメイン層の trait と Hub を組み合わせて、アプリケーション固有の処理を実装します。
//! UI 層（HTTP / WebSocket ハンドラ）からのみ呼び出されます。

pub mod connect_participant;
pub mod create_room;
pub mod disconnect_participant;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod send_message;

pub use connect_participant::{Admission, ConnectParticipantUseCase};
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{
    ConnectError, CreateRoomError, DisconnectError, GetRoomDetailError, GetRoomsError,
    SendMessageError,
};
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use get_rooms::GetRoomsUseCase;
pub use send_message::SendMessageUseCase;
