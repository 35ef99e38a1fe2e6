//! Room-scoped real-time chat relay.
//!
//! Clients connect over WebSocket, join a room and exchange text messages and
//! typing signals with everyone else in that room. A single hub loop owns
//! live membership and fan-out; persistence happens off the hot path.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
