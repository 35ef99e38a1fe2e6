//! UI 層
//!
//! axum のルーター、WebSocket アップグレード、接続ごとのポンプ、HTTP ハンドラを提供します。

pub mod connection;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use connection::{ConnectionSettings, PumpExit};
pub use server::Server;
pub use state::AppState;
