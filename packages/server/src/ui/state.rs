//! Shared application state.

use std::sync::Arc;

use chatrelay_shared::time::Clock;

use crate::{
    domain::{IdentityGateway, RoomDirectory},
    hub::HubHandle,
    usecase::{
        ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, SendMessageUseCase,
    },
};

use super::connection::ConnectionSettings;

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// Per-connection transport settings
    pub connection_settings: ConnectionSettings,
}

impl AppState {
    /// Build every use case from the collaborators they share
    pub fn new(
        identity_gateway: Arc<dyn IdentityGateway>,
        room_directory: Arc<dyn RoomDirectory>,
        hub: HubHandle,
        clock: Arc<dyn Clock>,
        connection_settings: ConnectionSettings,
    ) -> Self {
        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                identity_gateway,
                room_directory.clone(),
                hub.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                hub.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(hub.clone(), clock)),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(room_directory.clone())),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(room_directory.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(room_directory, hub)),
            connection_settings,
        }
    }
}
