//! Per-connection outbound queue.
//!
//! Every connection owns one bounded queue. The hub is the only writer and
//! never waits on it: an enqueue either succeeds immediately or reports why it
//! could not, and the caller applies an [`OverflowPolicy`].

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Capacity of a connection's outbound queue
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Serialized event, shared between all recipients of one fan-out
pub type Payload = Utf8Bytes;

/// What to do when a recipient's queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Close the queue and evict the connection (chat, join and leave events)
    Evict,
    /// Silently drop the payload for that recipient (typing signals)
    Drop,
}

/// Result of a non-blocking enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Queued,
    /// The queue is at capacity (slow consumer)
    Full,
    /// The writer side has gone away
    Closed,
}

/// Sending half, owned by the hub
///
/// Dropping it closes the queue; the writer drains what is left and stops.
#[derive(Debug)]
pub struct OutboundQueue {
    tx: mpsc::Sender<Payload>,
}

/// Receiving half, owned by the connection's outbound pump
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::Receiver<Payload>,
}

/// Create a bounded outbound queue
pub fn outbound_queue(capacity: usize) -> (OutboundQueue, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (OutboundQueue { tx }, OutboundReceiver { rx })
}

impl OutboundQueue {
    /// Try to enqueue without waiting
    pub fn offer(&self, payload: Payload) -> Offer {
        match self.tx.try_send(payload) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(_)) => Offer::Full,
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Close the queue
    pub fn close(self) {
        drop(self);
    }
}

impl OutboundReceiver {
    /// Wait for the next payload; `None` once the queue is closed and drained
    pub async fn recv(&mut self) -> Option<Payload> {
        self.rx.recv().await
    }

    /// Take a payload that is already queued, if any
    pub fn try_next(&mut self) -> Option<Payload> {
        self.rx.try_recv().ok()
    }

    /// Number of payloads currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
