//! SQLite 実装
//!
//! `sqlx` の `SqlitePool` を使った永続ストア。再起動後もルームと履歴が残ります。
//! テーブルは接続時に作成します。

mod message;
mod room;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use message::SqliteMessageArchive;
pub use room::SqliteRoomDirectory;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS rooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        room_id INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        username TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_room_timestamp
        ON messages (room_id, timestamp)",
];

/// SQLite データベースに接続し、スキーマを用意する
///
/// `sqlite::memory:` の場合は、最後の接続が閉じるとデータが消えるため
/// 接続を 1 本に固定して保持し続けます。
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(5);
    if database_url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }
    tracing::info!("Database ready: {}", database_url);

    Ok(pool)
}
