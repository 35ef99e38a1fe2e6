//! HTTP and WebSocket handlers.

pub mod http;
pub mod websocket;

pub use http::{create_room, get_room_detail, get_room_members, get_rooms, health_check};
pub use websocket::websocket_handler;
