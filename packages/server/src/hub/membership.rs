//! Room membership index.
//!
//! Tracks which connection keys belong to which room. Writes come from the
//! hub loop only; reads may come from anywhere (diagnostic endpoints), so the
//! map sits behind a reader/writer lock.

use std::collections::{BTreeSet, HashMap};

use tokio::sync::RwLock;

use crate::domain::{ConnectionKey, RoomId};

/// Room → connection keys
#[derive(Debug, Default)]
pub struct MembershipIndex {
    rooms: RwLock<HashMap<RoomId, BTreeSet<ConnectionKey>>>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to a room. Returns `false` if it was already present.
    pub async fn add(&self, room_id: RoomId, key: ConnectionKey) -> bool {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room_id).or_default().insert(key)
    }

    /// Remove a key from a room. Returns `false` if it was not present.
    pub async fn remove(&self, room_id: RoomId, key: &ConnectionKey) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(&room_id) else {
            return false;
        };
        let removed = members.remove(key);
        if members.is_empty() {
            rooms.remove(&room_id);
        }
        removed
    }

    /// Keys currently in a room, sorted
    pub async fn list(&self, room_id: RoomId) -> Vec<ConnectionKey> {
        let rooms = self.rooms.read().await;
        rooms
            .get(&room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn contains(&self, room_id: RoomId, key: &ConnectionKey) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(&room_id)
            .is_some_and(|members| members.contains(key))
    }
}
