//! Infrastructure 層
//!
//! - `dto`: WebSocket / HTTP のワイヤ表現
//! - `repository`: Room Directory / Message Archive の実装
//! - `auth`: Identity Gateway の実装

pub mod auth;
pub mod dto;
pub mod repository;
