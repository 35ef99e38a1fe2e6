//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State, ws::WebSocketUpgrade},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    domain::RoomId,
    ui::{connection::serve_connection, state::AppState},
    usecase::ConnectError,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    /// Bearer token; may be sent in the `Authorization` header instead
    pub token: Option<String>,
    /// Room to join; the default room when omitted
    pub room_id: Option<String>,
}

/// Authenticate, resolve the room, then upgrade.
///
/// Rejections happen before the upgrade, so a refused client never reaches
/// the hub.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id = match query.room_id.as_deref().map(str::trim) {
        None | Some("") => RoomId::DEFAULT,
        Some(raw) => match raw.parse::<u32>() {
            Ok(id) => RoomId::new(id),
            Err(_) => {
                tracing::warn!("Invalid room_id '{}'", raw);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
    };

    let credential = query.token.or_else(|| bearer_token(&headers));

    let admission = match state
        .connect_participant_usecase
        .admit(credential.as_deref(), room_id)
        .await
    {
        Ok(admission) => admission,
        Err(e) => {
            tracing::warn!("Rejecting WebSocket upgrade: {}", e);
            return Err(match e {
                ConnectError::MissingCredential | ConnectError::Unauthorized(_) => {
                    StatusCode::UNAUTHORIZED
                }
                ConnectError::RoomNotFound(_) => StatusCode::NOT_FOUND,
                ConnectError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            });
        }
    };

    tracing::info!(
        "Client '{}' admitted to room {} '{}'",
        admission.identity.name.as_str(),
        admission.room.id,
        admission.room.name.as_str()
    );
    let read_limit = state.connection_settings.read_limit;
    Ok(ws
        .max_message_size(read_limit)
        .max_frame_size(read_limit)
        .on_upgrade(move |socket| serve_connection(socket, state, admission)))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}
