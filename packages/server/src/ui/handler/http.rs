//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{CreateRoomRequest, RoomDto, RoomMembersDto},
    ui::state::AppState,
    usecase::{CreateRoomError, GetRoomDetailError},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomDto>>, StatusCode> {
    match state.get_rooms_usecase.execute().await {
        // Domain Model から DTO への変換
        Ok(rooms) => Ok(Json(rooms.into_iter().map(RoomDto::from).collect())),
        Err(e) => {
            tracing::error!("Failed to list rooms: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Create a room
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), StatusCode> {
    match state.create_room_usecase.execute(request.name).await {
        Ok(room) => Ok((StatusCode::CREATED, Json(room.into()))),
        Err(CreateRoomError::InvalidName(e)) => {
            tracing::debug!("Rejected room name: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(CreateRoomError::AlreadyExists(name)) => {
            tracing::debug!("Room '{}' already exists", name);
            Err(StatusCode::CONFLICT)
        }
        Err(CreateRoomError::Unavailable(e)) => {
            tracing::error!("Failed to create room: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDto>, StatusCode> {
    let room_id = parse_room_id(&room_id)?;
    let detail = state
        .get_room_detail_usecase
        .execute(room_id)
        .await
        .map_err(detail_error_status)?;
    Ok(Json(detail.room.into()))
}

/// Get the connection keys currently registered in a room (diagnostics)
pub async fn get_room_members(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomMembersDto>, StatusCode> {
    let room_id = parse_room_id(&room_id)?;
    let detail = state
        .get_room_detail_usecase
        .execute(room_id)
        .await
        .map_err(detail_error_status)?;
    let members = detail.members.iter().map(|key| key.to_string()).collect();
    Ok(Json(RoomMembersDto::new(detail.room.id, members)))
}

fn parse_room_id(raw: &str) -> Result<RoomId, StatusCode> {
    raw.parse::<u32>()
        .map(RoomId::new)
        .map_err(|_| StatusCode::BAD_REQUEST)
}

fn detail_error_status(err: GetRoomDetailError) -> StatusCode {
    match err {
        GetRoomDetailError::RoomNotFound(_) => StatusCode::NOT_FOUND,
        GetRoomDetailError::Unavailable(e) => {
            tracing::error!("Failed to get room: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
