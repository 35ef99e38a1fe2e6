//! Repository 実装
//!
//! - `inmemory`: プロセス内のみ（テスト用）
//! - `sqlite`: SQLite による永続化（サーバーの既定）

pub mod inmemory;
pub mod sqlite;

pub use inmemory::{InMemoryMessageArchive, InMemoryRoomDirectory};
pub use sqlite::{SqliteMessageArchive, SqliteRoomDirectory};
