//! インメモリ実装
//!
//! 単一プロセス内で完結するストア。再起動するとデータは失われます。

mod message;
mod room;

pub use message::InMemoryMessageArchive;
pub use room::InMemoryRoomDirectory;
