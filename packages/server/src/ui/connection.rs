//! Per-connection duplex pumps.
//!
//! Once an upgrade completes the socket is split in two. The inbound pump
//! reads frames, classifies them and hands them to the hub; the outbound
//! pump drains the connection's queue onto the socket and sends keep-alive
//! pings. Whichever pump stops first ends the session, and the connection is
//! then unregistered from the hub.

use std::{fmt::Display, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::{Stream, StreamExt},
};
use thiserror::Error;
use tokio::{
    task::JoinError,
    time::{Instant, timeout, timeout_at},
};

use crate::{
    domain::{ConnectionId, Identity, RoomId},
    hub::{DEFAULT_OUTBOUND_CAPACITY, OutboundReceiver, Payload, outbound_queue},
    infrastructure::dto::websocket::{FrameError, InboundFrame},
    usecase::{Admission, SendMessageError},
};

use super::state::AppState;

/// Transport tunables for one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Capacity of the outbound queue
    pub outbound_capacity: usize,
    /// Largest inbound frame accepted, in bytes; larger ones are discarded
    pub max_frame_size: usize,
    /// Hard cap on an inbound message at the transport; exceeding it ends the session
    pub read_limit: usize,
    /// Time allowed for a single write to the peer
    pub write_wait: Duration,
    /// Time allowed between pongs before the peer is considered gone
    pub pong_wait: Duration,
    /// Interval between pings; must be shorter than `pong_wait`
    pub ping_period: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            max_frame_size: 512,
            read_limit: 64 * 1024,
            write_wait: Duration::from_secs(10),
            pong_wait,
            ping_period: pong_wait * 9 / 10,
        }
    }
}

/// Why a pump stopped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PumpExit {
    #[error("connection closed by peer")]
    TransportClosed,

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("no pong received within the liveness deadline")]
    LivenessTimeout,

    #[error("hub refused a message: {0}")]
    HubRejected(SendMessageError),

    /// The hub closed the outbound queue (leave or eviction)
    #[error("outbound queue closed")]
    QueueClosed,

    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Run an admitted connection until either pump stops, then unregister it.
pub async fn serve_connection(socket: WebSocket, state: Arc<AppState>, admission: Admission) {
    let settings = state.connection_settings;
    let connection_id = ConnectionId::generate();
    let room_id = admission.room.id;
    let username = admission.identity.name.as_str().to_string();
    let (queue, outbound) = outbound_queue(settings.outbound_capacity);

    if let Err(e) = state
        .connect_participant_usecase
        .execute(connection_id, &admission, queue)
        .await
    {
        tracing::error!("Failed to register '{}' with the hub: {}", username, e);
        return;
    }

    let (sink, stream) = socket.split();
    let mut write_task = tokio::spawn(write_pump(sink, outbound, settings));
    let mut read_task = tokio::spawn(read_pump(
        stream,
        state.clone(),
        connection_id,
        admission,
        settings,
    ));

    // If the writer stops first the reader is useless; abort it.
    let writer_done = tokio::select! {
        result = &mut read_task => {
            log_exit(&username, "inbound", result);
            false
        }
        result = &mut write_task => {
            read_task.abort();
            log_exit(&username, "outbound", result);
            true
        }
    };

    if let Err(e) = state
        .disconnect_participant_usecase
        .execute(connection_id, room_id)
        .await
    {
        tracing::warn!("Failed to unregister '{}' ({}): {}", username, connection_id, e);
    }

    // The leave closes the queue: give the writer a moment to flush and say goodbye.
    if !writer_done {
        match timeout(settings.write_wait, &mut write_task).await {
            Ok(result) => log_exit(&username, "outbound", result),
            Err(_) => {
                write_task.abort();
                tracing::debug!("Outbound pump for '{}' did not finish in time", username);
            }
        }
    }

    tracing::info!("Client '{}' ({}) disconnected", username, connection_id);
}

fn log_exit(username: &str, side: &str, result: Result<PumpExit, JoinError>) {
    match result {
        Ok(exit @ (PumpExit::TransportClosed | PumpExit::QueueClosed)) => {
            tracing::debug!("{} pump for '{}' stopped: {}", side, username, exit);
        }
        Ok(exit) => tracing::warn!("{} pump for '{}' stopped: {}", side, username, exit),
        Err(e) if e.is_cancelled() => {}
        Err(e) => tracing::error!("{} pump for '{}' panicked: {}", side, username, e),
    }
}

/// Read frames until the peer goes away or misses its liveness deadline
async fn read_pump<S>(
    mut stream: S,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    admission: Admission,
    settings: ConnectionSettings,
) -> PumpExit
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let identity = admission.identity;
    let room_id = admission.room.id;
    let mut deadline = Instant::now() + settings.pong_wait;

    loop {
        let message = match timeout_at(deadline, stream.next()).await {
            Err(_) => return PumpExit::LivenessTimeout,
            Ok(None) => return PumpExit::TransportClosed,
            Ok(Some(Err(e))) => return PumpExit::TransportError(e.to_string()),
            Ok(Some(Ok(message))) => message,
        };

        let bytes: &[u8] = match &message {
            Message::Text(text) => text.as_str().as_bytes(),
            Message::Binary(data) => data.as_ref(),
            Message::Pong(_) => {
                deadline = Instant::now() + settings.pong_wait;
                continue;
            }
            // Answered by the transport
            Message::Ping(_) => continue,
            Message::Close(_) => return PumpExit::TransportClosed,
        };

        let frame = InboundFrame::parse(bytes, settings.max_frame_size);
        if let Err(exit) = handle_frame(&state, connection_id, &identity, room_id, frame) {
            return exit;
        }
    }
}

/// Classify one inbound frame and submit it to the hub.
///
/// Only a refused text message stops the connection; everything else is
/// dropped in place.
fn handle_frame(
    state: &AppState,
    connection_id: ConnectionId,
    identity: &Identity,
    room_id: RoomId,
    frame: Result<InboundFrame, FrameError>,
) -> Result<(), PumpExit> {
    match frame {
        Ok(InboundFrame::Text { content }) => state
            .send_message_usecase
            .execute(connection_id, identity, room_id, content)
            .map_err(PumpExit::HubRejected),
        Ok(InboundFrame::Typing { is_typing }) => {
            if let Err(e) = state
                .send_message_usecase
                .notify_typing(identity, room_id, is_typing)
            {
                tracing::debug!("Dropping typing signal from '{}': {}", identity.name.as_str(), e);
            }
            Ok(())
        }
        Err(FrameError::EmptyContent) => {
            tracing::debug!("Ignoring empty message from '{}'", identity.name.as_str());
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Discarding frame from '{}': {}", identity.name.as_str(), e);
            Ok(())
        }
    }
}

/// Drain the outbound queue onto the socket and keep the peer alive
async fn write_pump<S>(
    mut sink: S,
    mut outbound: OutboundReceiver,
    settings: ConnectionSettings,
) -> PumpExit
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ping = tokio::time::interval_at(
        Instant::now() + settings.ping_period,
        settings.ping_period,
    );

    loop {
        tokio::select! {
            payload = outbound.recv() => {
                let Some(payload) = payload else {
                    // Best effort: the peer may already be gone
                    let _ = timeout(settings.write_wait, sink.send(Message::Close(None))).await;
                    return PumpExit::QueueClosed;
                };
                if let Err(exit) = write_batch(&mut sink, &mut outbound, payload, settings.write_wait).await {
                    return exit;
                }
            }
            _ = ping.tick() => {
                match timeout(settings.write_wait, sink.send(Message::Ping(Bytes::new()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => return PumpExit::WriteFailed(e.to_string()),
                    Err(_) => return PumpExit::WriteFailed("ping timed out".to_string()),
                }
            }
        }
    }
}

/// Write one payload plus whatever is already queued behind it, then flush once.
///
/// Each payload stays its own frame.
async fn write_batch<S>(
    sink: &mut S,
    outbound: &mut OutboundReceiver,
    first: Payload,
    write_wait: Duration,
) -> Result<(), PumpExit>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let write = async {
        sink.feed(Message::Text(first)).await?;
        for _ in 0..outbound.len() {
            let Some(payload) = outbound.try_next() else {
                break;
            };
            sink.feed(Message::Text(payload)).await?;
        }
        sink.flush().await
    };

    match timeout(write_wait, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(PumpExit::WriteFailed(e.to_string())),
        Err(_) => Err(PumpExit::WriteFailed("write timed out".to_string())),
    }
}
