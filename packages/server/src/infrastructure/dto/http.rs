//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Room representation returned by the room API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomDto {
    pub id: u32,
    pub name: String,
    /// RFC 3339 (UTC)
    pub created_at: String,
}

/// Request body for `POST /api/rooms`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: String,
}

/// Membership Index listing for one room (diagnostics)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomMembersDto {
    pub room_id: u32,
    pub members: Vec<String>,
}
