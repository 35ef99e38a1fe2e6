//! Submission side of the hub.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::{
    ChatEvent, ConnectionId, Identity, MessageArchive, MessageEvent, RoomId, TypingSignal,
};

use super::{MembershipIndex, OutboundQueue};

/// A connection asking to be registered in its room
#[derive(Debug)]
pub struct JoinRequest {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub room_id: RoomId,
    /// Sending half of the connection's outbound queue; ownership moves to the hub
    pub queue: OutboundQueue,
}

/// Joins, leaves and room events share one channel, so the hub sees them in
/// the order they were submitted.
#[derive(Debug)]
pub(super) enum Command {
    Join {
        request: JoinRequest,
        /// Archived history, oldest first
        history: Vec<MessageEvent>,
    },
    Leave {
        connection_id: ConnectionId,
        room_id: RoomId,
    },
    Broadcast {
        /// Connection the event was read from
        origin: ConnectionId,
        event: ChatEvent,
    },
}

/// Why a submission to the hub was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The hub's input buffer is full
    #[error("hub is saturated")]
    Saturated,

    /// The hub loop is no longer running
    #[error("hub is not running")]
    Closed,
}

impl<T> From<TrySendError<T>> for SubmitError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => SubmitError::Saturated,
            TrySendError::Closed(_) => SubmitError::Closed,
        }
    }
}

/// Cloneable handle used by connections to talk to the hub
#[derive(Clone)]
pub struct HubHandle {
    pub(super) command_tx: mpsc::Sender<Command>,
    pub(super) typing_tx: mpsc::Sender<TypingSignal>,
    pub(super) membership: Arc<MembershipIndex>,
    pub(super) archive: Arc<dyn MessageArchive>,
    pub(super) history_limit: usize,
}

impl HubHandle {
    /// Register a connection in its room.
    ///
    /// Recent history is fetched here, on the caller's task, and handed to the
    /// hub together with the join so the hub loop never waits on storage.
    /// An unavailable archive only means an empty replay.
    pub async fn join(&self, request: JoinRequest) -> Result<(), SubmitError> {
        let history = self.load_history(request.room_id).await;
        self.command_tx
            .send(Command::Join { request, history })
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Unregister a connection. Leaving twice is harmless.
    pub async fn leave(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), SubmitError> {
        self.command_tx
            .send(Command::Leave {
                connection_id,
                room_id,
            })
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// Submit an event read from `origin` for fan-out to its room without waiting.
    ///
    /// The hub discards it if `origin` is no longer a member of the room.
    pub fn try_broadcast(&self, origin: ConnectionId, event: ChatEvent) -> Result<(), SubmitError> {
        self.command_tx
            .try_send(Command::Broadcast { origin, event })
            .map_err(SubmitError::from)
    }

    /// Submit a typing signal without waiting
    pub fn try_typing(&self, signal: TypingSignal) -> Result<(), SubmitError> {
        self.typing_tx.try_send(signal).map_err(SubmitError::from)
    }

    /// Read access to the membership index
    pub fn membership(&self) -> &MembershipIndex {
        &self.membership
    }

    async fn load_history(&self, room_id: RoomId) -> Vec<MessageEvent> {
        match self.archive.recent(room_id, self.history_limit).await {
            Ok(mut messages) => {
                // newest-first at the store
                messages.retain(|message| message.room_id == room_id);
                messages.truncate(self.history_limit);
                messages.reverse();
                messages
            }
            Err(e) => {
                tracing::warn!("Skipping history replay for room {}: {}", room_id, e);
                Vec::new()
            }
        }
    }
}
