//! The hub's coordinating loop.
//!
//! All membership changes and fan-out decisions happen here, strictly one
//! event at a time. The loop never waits on a client or on storage: outbound
//! enqueues are non-blocking and persistence runs on detached tasks.

use std::{collections::HashMap, sync::Arc};

use chatrelay_shared::time::Clock;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{
        ChatEvent, ConnectionId, ConnectionKey, Identity, MessageArchive, MessageEvent, RoomId,
        Timestamp, TypingSignal, UserId,
    },
    infrastructure::dto::conversion::encode_event,
};

use super::{
    HubConfig, HubHandle, JoinRequest, MembershipIndex, Offer, OutboundQueue, OverflowPolicy,
    Payload, handle::Command,
};

/// A registered connection, as seen by the hub
#[derive(Debug)]
struct Member {
    identity: Identity,
    key: ConnectionKey,
    queue: OutboundQueue,
}

struct Inbox {
    command_rx: mpsc::Receiver<Command>,
    typing_rx: mpsc::Receiver<TypingSignal>,
}

/// State private to the loop; nothing else mutates it
struct HubState {
    rooms: HashMap<RoomId, HashMap<ConnectionId, Member>>,
    membership: Arc<MembershipIndex>,
    archive: Arc<dyn MessageArchive>,
    clock: Arc<dyn Clock>,
}

/// The connection hub
pub struct Hub {
    state: HubState,
    inbox: Inbox,
}

impl Hub {
    /// Create a hub and the handle used to submit events to it
    ///
    /// The hub does nothing until [`Hub::run`] is awaited.
    pub fn new(
        archive: Arc<dyn MessageArchive>,
        clock: Arc<dyn Clock>,
        config: HubConfig,
    ) -> (Self, HubHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (typing_tx, typing_rx) = mpsc::channel(config.typing_capacity);
        let membership = Arc::new(MembershipIndex::new());

        let handle = HubHandle {
            command_tx,
            typing_tx,
            membership: membership.clone(),
            archive: archive.clone(),
            history_limit: config.history_limit,
        };

        let hub = Self {
            state: HubState {
                rooms: HashMap::new(),
                membership,
                archive,
                clock,
            },
            inbox: Inbox {
                command_rx,
                typing_rx,
            },
        };

        (hub, handle)
    }

    /// Create a hub and run it on a new task
    pub fn spawn(
        archive: Arc<dyn MessageArchive>,
        clock: Arc<dyn Clock>,
        config: HubConfig,
    ) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(archive, clock, config);
        (handle, tokio::spawn(hub.run()))
    }

    /// Process events until every [`HubHandle`] has been dropped
    pub async fn run(self) {
        let Hub {
            mut state,
            mut inbox,
        } = self;
        tracing::info!("Hub started");

        loop {
            // Commands first, so a typing signal never runs ahead of its
            // author's pending join.
            tokio::select! {
                biased;
                command = inbox.command_rx.recv() => match command {
                    Some(Command::Join { request, history }) => {
                        state.on_join(request, history).await;
                    }
                    Some(Command::Leave { connection_id, room_id }) => {
                        state.on_leave(connection_id, room_id).await;
                    }
                    Some(Command::Broadcast { origin, event }) => {
                        state.on_broadcast(origin, event).await;
                    }
                    None => break,
                },
                Some(signal) = inbox.typing_rx.recv() => state.on_typing(signal).await,
            }
        }

        tracing::info!("Hub stopped");
    }
}

impl HubState {
    async fn on_join(&mut self, request: JoinRequest, history: Vec<MessageEvent>) {
        let JoinRequest {
            connection_id,
            identity,
            room_id,
            queue,
        } = request;
        let key = identity.connection_key();

        self.membership.add(room_id, key.clone()).await;

        let replayed = replay_history(&queue, history);
        tracing::info!(
            "Client '{}' ({}) joined room {} ({} messages replayed)",
            identity.name.as_str(),
            connection_id,
            room_id,
            replayed
        );

        let notice = ChatEvent::joined(identity.clone(), room_id, self.now());
        self.rooms.entry(room_id).or_default().insert(
            connection_id,
            Member {
                identity,
                key,
                queue,
            },
        );

        self.fan_out(&notice, OverflowPolicy::Evict, None).await;
    }

    async fn on_leave(&mut self, connection_id: ConnectionId, room_id: RoomId) {
        let Some(member) = self.remove_member(room_id, connection_id).await else {
            tracing::debug!("Connection {} already left room {}", connection_id, room_id);
            return;
        };
        member.queue.close();
        tracing::info!(
            "Client '{}' ({}) left room {}",
            member.identity.name.as_str(),
            connection_id,
            room_id
        );

        let notice = ChatEvent::left(member.identity, room_id, self.now());
        self.fan_out(&notice, OverflowPolicy::Evict, None).await;
    }

    async fn on_broadcast(&mut self, origin: ConnectionId, event: ChatEvent) {
        let room_id = event.room_id();
        if !self.is_member(room_id, origin) {
            // Left or evicted while the event was queued
            tracing::debug!(
                "Discarding {:?} event from {}: not a member of room {}",
                event.kind(),
                origin,
                room_id
            );
            return;
        }
        if let ChatEvent::Typing(signal) = event {
            self.on_typing(signal).await;
            return;
        }
        if let Some(message) = event.persistable() {
            self.persist(message.clone());
        }
        self.fan_out(&event, OverflowPolicy::Evict, None).await;
    }

    async fn on_typing(&mut self, signal: TypingSignal) {
        let author = signal.author.id.clone();
        let event = ChatEvent::Typing(signal);
        self.fan_out(&event, OverflowPolicy::Drop, Some(&author))
            .await;
    }

    /// Hand a message to the archive on a detached task
    fn persist(&self, message: MessageEvent) {
        let archive = self.archive.clone();
        tokio::spawn(async move {
            let id = message.id;
            if let Err(e) = archive.append(message).await {
                tracing::error!("Failed to persist message {}: {}", id, e);
            }
        });
    }

    /// Deliver an event to every member of its room.
    ///
    /// With [`OverflowPolicy::Evict`], members whose queue is full are closed
    /// and removed on the spot. A queue whose writer is already gone is left
    /// alone: that connection's own leave is on its way.
    async fn fan_out(
        &mut self,
        event: &ChatEvent,
        policy: OverflowPolicy,
        exclude: Option<&UserId>,
    ) {
        let Some(payload) = encode(event) else {
            return;
        };
        let room_id = event.room_id();
        let Some(members) = self.rooms.get(&room_id) else {
            return;
        };

        let mut slow = Vec::new();
        for (connection_id, member) in members {
            if exclude.is_some_and(|author| *author == member.identity.id) {
                continue;
            }
            match member.queue.offer(payload.clone()) {
                Offer::Queued | Offer::Closed => {}
                Offer::Full => {
                    if policy == OverflowPolicy::Evict {
                        slow.push(*connection_id);
                    }
                }
            }
        }

        for connection_id in slow {
            if let Some(member) = self.remove_member(room_id, connection_id).await {
                tracing::warn!(
                    "Evicting slow consumer '{}' ({}) from room {}",
                    member.identity.name.as_str(),
                    connection_id,
                    room_id
                );
                member.queue.close();
            }
        }
    }

    /// Drop a member from the room table and keep the index in sync
    async fn remove_member(
        &mut self,
        room_id: RoomId,
        connection_id: ConnectionId,
    ) -> Option<Member> {
        let members = self.rooms.get_mut(&room_id)?;
        let member = members.remove(&connection_id)?;

        // Several sessions may share one key
        let key_in_use = members.values().any(|other| other.key == member.key);
        if members.is_empty() {
            self.rooms.remove(&room_id);
        }
        if !key_in_use {
            self.membership.remove(room_id, &member.key).await;
        }

        Some(member)
    }

    fn is_member(&self, room_id: RoomId, connection_id: ConnectionId) -> bool {
        self.rooms
            .get(&room_id)
            .is_some_and(|members| members.contains_key(&connection_id))
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

/// Enqueue archived messages onto a single connection, oldest first.
///
/// Stops at the first refusal; the rest of the history is skipped.
fn replay_history(queue: &OutboundQueue, history: Vec<MessageEvent>) -> usize {
    let mut replayed = 0;
    for message in history {
        let Some(payload) = encode(&ChatEvent::Text(message)) else {
            continue;
        };
        match queue.offer(payload) {
            Offer::Queued => replayed += 1,
            Offer::Full | Offer::Closed => break,
        }
    }
    replayed
}

fn encode(event: &ChatEvent) -> Option<Payload> {
    match encode_event(event) {
        Ok(json) => Some(Payload::from(json)),
        Err(e) => {
            tracing::error!("Failed to serialize {:?} event: {}", event.kind(), e);
            None
        }
    }
}
